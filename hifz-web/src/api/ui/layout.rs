//! Page shell and escaping helpers

use std::borrow::Cow;

use serde::Serialize;

/// Escape text for HTML element content and quoted attribute values
pub fn escape(text: &str) -> Cow<'_, str> {
    html_escape::encode_safe(text)
}

/// Serialize `value` for a `<script type="application/json">` block
///
/// `<`, `>` and `&` only occur inside JSON strings, where their `\u` escapes
/// are equivalent, so the block can never close the script element early.
pub fn json_for_script<T: Serialize>(value: &T) -> serde_json::Result<String> {
    let json = serde_json::to_string(value)?;
    Ok(json
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026"))
}

/// Full HTML document around `body`
pub fn page(title: &str, body: &str) -> String {
    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <meta name="theme-color" content="#1f6f50">
    <title>{title}</title>
    <link rel="manifest" href="/manifest.webmanifest">
    <link rel="icon" href="/icon.svg" type="image/svg+xml">
    <link rel="stylesheet" href="https://fonts.googleapis.com/css2?family=Scheherazade+New:wght@400;700&display=swap">
    <link rel="stylesheet" href="/static/hifz.css">
    <script src="https://unpkg.com/htmx.org@1.9.10"></script>
    <script src="/static/playback.js" defer></script>
</head>
<body>
    <header class="site-header">
        <h1>Quran Memorize</h1>
        <p class="subtitle">Learn a passage verse by verse, with cumulative review</p>
    </header>
    <main class="container">
{body}
    </main>
    <footer class="build-info">hifz-web v{version} ({git_hash})</footer>
    <script>
        // Validation and upstream errors carry a message fragment; show it
        document.addEventListener('htmx:beforeSwap', function (evt) {{
            var status = evt.detail.xhr.status;
            if (status === 422 || status === 502) {{
                evt.detail.shouldSwap = true;
                evt.detail.isError = false;
            }}
        }});
        if ('serviceWorker' in navigator) {{
            navigator.serviceWorker.register('/sw.js').catch(function (err) {{
                console.warn('Service worker registration failed', err);
            }});
        }}
    </script>
</body>
</html>"##,
        title = escape(title),
        body = body,
        version = env!("CARGO_PKG_VERSION"),
        git_hash = env!("GIT_HASH"),
    )
}
