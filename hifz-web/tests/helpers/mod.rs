//! Shared test fixtures: an in-process content source and request helpers
#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use hifz_common::config::ServerConfig;
use hifz_common::content::{Chapter, Reciter, Translation, VerseText};
use hifz_web::content::{ContentError, ContentSource};
use hifz_web::{build_router, AppState};
use http_body_util::BodyExt;
use tower::ServiceExt;

/// Content source backed by fixed data
///
/// Every chapter has `verse_count` verses. Failures are switched on per call type.
#[derive(Debug, Default)]
pub struct FakeContentSource {
    pub verse_count: u32,
    pub fail_catalogs: bool,
    pub fail_verses: bool,
    pub fail_audio: bool,
    pub no_audio: BTreeSet<u32>,
    pub audio_lookups: AtomicUsize,
}

impl FakeContentSource {
    pub fn new(verse_count: u32) -> Self {
        Self {
            verse_count,
            ..Default::default()
        }
    }

    pub fn audio_lookups(&self) -> usize {
        self.audio_lookups.load(Ordering::SeqCst)
    }

    fn unavailable<T>(&self) -> Result<T, ContentError> {
        Err(ContentError::NetworkError("connection refused".to_string()))
    }
}

#[async_trait]
impl ContentSource for FakeContentSource {
    async fn fetch_chapters(&self) -> Result<Vec<Chapter>, ContentError> {
        if self.fail_catalogs {
            return self.unavailable();
        }
        Ok(vec![
            Chapter {
                id: 1,
                display_name: "Al-Fatihah".to_string(),
                native_name: "الفاتحة".to_string(),
                verse_count: 7,
            },
            Chapter {
                id: 112,
                display_name: "Al-Ikhlas".to_string(),
                native_name: "الإخلاص".to_string(),
                verse_count: 4,
            },
        ])
    }

    async fn fetch_reciters(&self) -> Result<Vec<Reciter>, ContentError> {
        if self.fail_catalogs {
            return self.unavailable();
        }
        Ok(vec![Reciter {
            id: 7,
            name: "Mishari Rashid al-`Afasy".to_string(),
            style: None,
        }])
    }

    async fn fetch_translations(&self) -> Result<Vec<Translation>, ContentError> {
        if self.fail_catalogs {
            return self.unavailable();
        }
        Ok(vec![Translation {
            id: 131,
            name: "Dr. Mustafa Khattab, The Clear Quran".to_string(),
            author: Some("Dr. Mustafa Khattab".to_string()),
            language: "english".to_string(),
        }])
    }

    async fn fetch_verses(
        &self,
        _chapter: u32,
        start: u32,
        end: u32,
        translation: Option<u32>,
    ) -> Result<BTreeMap<u32, VerseText>, ContentError> {
        if self.fail_verses {
            return self.unavailable();
        }
        Ok((start..=end.min(self.verse_count))
            .map(|n| {
                (
                    n,
                    VerseText {
                        arabic_text: format!("آية {}", n),
                        translation_text: translation.map(|_| format!("Verse {} <in English>", n)),
                    },
                )
            })
            .collect())
    }

    async fn fetch_audio_url(
        &self,
        reciter: u32,
        chapter: u32,
        verse: u32,
    ) -> Result<Option<String>, ContentError> {
        self.audio_lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail_audio {
            return self.unavailable();
        }
        if self.no_audio.contains(&verse) {
            return Ok(None);
        }
        Ok(Some(format!(
            "https://verses.quran.com/{}/{:03}{:03}.mp3",
            reciter, chapter, verse
        )))
    }
}

pub fn test_app(source: Arc<FakeContentSource>) -> Router {
    build_router(AppState::new(ServerConfig::default(), source))
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// Form post as htmx sends it
pub fn htmx_post(uri: &str, form: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .header("hx-request", "true")
        .body(Body::from(form.to_string()))
        .unwrap()
}

/// Form post without JavaScript
pub fn plain_post(uri: &str, form: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap()
}

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn header(response: &Response<Body>, name: &str) -> String {
    response
        .headers()
        .get(name)
        .map(|v| v.to_str().unwrap().to_string())
        .unwrap_or_default()
}

/// JSON embedded in the session fragment
pub fn session_json(html: &str) -> serde_json::Value {
    let marker = r#"data-role="session-data">"#;
    let start = html.find(marker).expect("session data block") + marker.len();
    let end = html[start..].find("</script>").expect("closing script tag") + start;
    serde_json::from_str(&html[start..end]).unwrap()
}
