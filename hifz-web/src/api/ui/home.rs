//! Home page - session setup form

use std::collections::BTreeMap;

use axum::{extract::State, response::Html};
use hifz_common::config::ServerConfig;
use hifz_common::content::{Chapter, Reciter, Translation};
use hifz_common::range::CHAPTER_COUNT;
use tracing::warn;

use super::layout::{escape, page};
use crate::content::ContentError;
use crate::AppState;

/// Catalog lists for the form; `None` when the content API failed
#[derive(Debug, Default)]
pub struct Catalogs {
    pub chapters: Option<Vec<Chapter>>,
    pub reciters: Option<Vec<Reciter>>,
    pub translations: Option<Vec<Translation>>,
}

impl Catalogs {
    pub fn from_results(
        chapters: Result<Vec<Chapter>, ContentError>,
        reciters: Result<Vec<Reciter>, ContentError>,
        translations: Result<Vec<Translation>, ContentError>,
    ) -> Self {
        Self {
            chapters: degrade("chapters", chapters),
            reciters: degrade("reciters", reciters),
            translations: degrade("translations", translations),
        }
    }

    fn is_degraded(&self) -> bool {
        self.chapters.is_none() || self.reciters.is_none() || self.translations.is_none()
    }
}

fn degrade<T>(catalog: &str, result: Result<Vec<T>, ContentError>) -> Option<Vec<T>> {
    match result {
        Ok(items) if !items.is_empty() => Some(items),
        Ok(_) => {
            warn!(catalog, "Content API returned an empty catalog");
            None
        }
        Err(e) => {
            warn!(catalog, error = %e, "Catalog unavailable, rendering fallback form");
            None
        }
    }
}

/// GET /
///
/// Session setup form populated from the chapter, reciter and translation catalogs
pub async fn home_page(State(state): State<AppState>) -> Html<String> {
    let content = state.content.as_ref();
    let (chapters, reciters, translations) = tokio::join!(
        content.fetch_chapters(),
        content.fetch_reciters(),
        content.fetch_translations()
    );
    let catalogs = Catalogs::from_results(chapters, reciters, translations);

    Html(page("Quran Memorize", &render_setup_form(&catalogs, &state.config)))
}

/// Setup form plus the empty session target
pub fn render_setup_form(catalogs: &Catalogs, config: &ServerConfig) -> String {
    let notice = if catalogs.is_degraded() {
        r#"<div class="notice notice-warning" role="status">Some catalogs could not be loaded; defaults are shown instead.</div>"#
    } else {
        ""
    };

    format!(
        r##"        <section class="card">
            {notice}
            <form hx-post="/memorize" hx-target="#session" hx-swap="innerHTML" action="/memorize" method="post">
                <div class="form-grid">
                    {chapter}
                    {reciter}
                    {translation}
                    <div class="field"><label for="start">Start verse</label><input id="start" type="number" name="start" value="1" min="1" required></div>
                    <div class="field"><label for="end">End verse</label><input id="end" type="number" name="end" value="5" min="1" required></div>
                    <div class="field"><label for="repeats">Repeats</label><input id="repeats" type="number" name="repeats" value="3" min="1" max="{max_repeats}" required></div>
                </div>
                <p class="hint">Up to {max_verses} verses per session.</p>
                <button type="submit" class="button button-primary">Start memorizing</button>
            </form>
        </section>
        <div id="session"></div>"##,
        notice = notice,
        chapter = chapter_field(catalogs.chapters.as_deref()),
        reciter = reciter_field(catalogs.reciters.as_deref(), config.content.default_reciter),
        translation = translation_field(catalogs.translations.as_deref()),
        max_repeats = config.session.max_repeats,
        max_verses = config.session.max_verses,
    )
}

fn chapter_field(chapters: Option<&[Chapter]>) -> String {
    match chapters {
        Some(chapters) => {
            let options: String = chapters
                .iter()
                .map(|c| {
                    format!(
                        r#"<option value="{}">{}. {} ({}) - {} verses</option>"#,
                        c.id,
                        c.id,
                        escape(&c.display_name),
                        escape(&c.native_name),
                        c.verse_count
                    )
                })
                .collect();
            format!(
                r#"<div class="field"><label for="chapter">Chapter</label><select id="chapter" name="chapter">{}</select></div>"#,
                options
            )
        }
        None => format!(
            r#"<div class="field"><label for="chapter">Chapter</label><input id="chapter" type="number" name="chapter" value="1" min="1" max="{}" required></div>"#,
            CHAPTER_COUNT
        ),
    }
}

fn reciter_field(reciters: Option<&[Reciter]>, default_reciter: u32) -> String {
    match reciters {
        Some(reciters) => {
            let options: String = reciters
                .iter()
                .map(|r| {
                    let selected = if r.id == default_reciter { " selected" } else { "" };
                    format!(
                        r#"<option value="{}"{}>{}</option>"#,
                        r.id,
                        selected,
                        escape(&r.label())
                    )
                })
                .collect();
            format!(
                r#"<div class="field"><label for="reciter">Reciter</label><select id="reciter" name="reciter">{}</select></div>"#,
                options
            )
        }
        None => format!(
            r#"<input type="hidden" name="reciter" value="{}">"#,
            default_reciter
        ),
    }
}

fn translation_field(translations: Option<&[Translation]>) -> String {
    let mut options = String::from(r#"<option value="none" selected>No translation</option>"#);

    if let Some(translations) = translations {
        let mut by_language: BTreeMap<&str, Vec<&Translation>> = BTreeMap::new();
        for t in translations {
            by_language.entry(t.language.as_str()).or_default().push(t);
        }
        for (language, entries) in by_language {
            options.push_str(&format!(r#"<optgroup label="{}">"#, escape(&capitalize(language))));
            for t in entries {
                let label = match &t.author {
                    Some(author) if !author.is_empty() && !t.name.contains(author.as_str()) => {
                        format!("{} ({})", t.name, author)
                    }
                    _ => t.name.clone(),
                };
                options.push_str(&format!(
                    r#"<option value="{}">{}</option>"#,
                    t.id,
                    escape(&label)
                ));
            }
            options.push_str("</optgroup>");
        }
    }

    format!(
        r#"<div class="field"><label for="translation">Translation</label><select id="translation" name="translation">{}</select></div>"#,
        options
    )
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
