//! quran.com API v4 client
//!
//! Endpoints used:
//! - `GET /chapters`
//! - `GET /resources/recitations`
//! - `GET /resources/translations`
//! - `GET /verses/by_chapter/{chapter}` (paged, at most 50 verses per page)
//! - `GET /recitations/{reciter}/by_ayah/{chapter}:{verse}`

use std::collections::BTreeMap;
use std::future::Future;

use async_trait::async_trait;
use hifz_common::config::ContentConfig;
use hifz_common::content::{Chapter, Reciter, Translation, VerseText};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{ContentError, ContentSource};

const USER_AGENT: &str = concat!("hifz/", env!("CARGO_PKG_VERSION"));
/// API maximum for `per_page`
const VERSES_PER_PAGE: u32 = 50;
/// Longest chapter has 286 verses; anything beyond this is a pagination bug
const MAX_PAGES: u32 = 10;

// Footnote markers carry their number as content: `<sup foot_note="77">1</sup>`
static FOOTNOTE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<sup[^>]*>.*?</sup>").expect("footnote pattern"));
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("tag pattern"));
static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

#[derive(Debug, Deserialize)]
struct ChaptersResponse {
    chapters: Vec<ApiChapter>,
}

#[derive(Debug, Deserialize)]
struct ApiChapter {
    id: u32,
    name_simple: String,
    name_arabic: String,
    verses_count: u32,
}

#[derive(Debug, Deserialize)]
struct RecitationsResponse {
    recitations: Vec<ApiRecitation>,
}

#[derive(Debug, Deserialize)]
struct ApiRecitation {
    id: u32,
    reciter_name: String,
    style: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TranslationsResponse {
    translations: Vec<ApiTranslation>,
}

#[derive(Debug, Deserialize)]
struct ApiTranslation {
    id: u32,
    name: String,
    author_name: Option<String>,
    language_name: String,
}

#[derive(Debug, Deserialize)]
struct VersesResponse {
    verses: Vec<ApiVerse>,
    pagination: Option<ApiPagination>,
}

#[derive(Debug, Deserialize)]
struct ApiVerse {
    verse_number: u32,
    text_uthmani: Option<String>,
    #[serde(default)]
    translations: Vec<ApiVerseTranslation>,
}

#[derive(Debug, Deserialize)]
struct ApiVerseTranslation {
    text: String,
}

#[derive(Debug, Deserialize)]
struct ApiPagination {
    next_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct AudioFilesResponse {
    audio_files: Vec<ApiAudioFile>,
}

#[derive(Debug, Deserialize)]
struct ApiAudioFile {
    url: String,
}

/// quran.com API v4 client
pub struct QuranComClient {
    http_client: reqwest::Client,
    api_base_url: String,
    audio_base_url: String,
}

impl QuranComClient {
    pub fn new(config: &ContentConfig) -> Result<Self, ContentError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ContentError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            audio_base_url: config.audio_base_url.clone(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ContentError> {
        let url = format!("{}{}", self.api_base_url, path);
        tracing::debug!(url = %url, ?query, "Querying content API");

        let response = self
            .http_client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| ContentError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ContentError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ContentError::ApiError(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ContentError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl ContentSource for QuranComClient {
    async fn fetch_chapters(&self) -> Result<Vec<Chapter>, ContentError> {
        let response: ChaptersResponse = self.get_json("/chapters", &[]).await?;
        Ok(response.chapters.into_iter().map(Chapter::from).collect())
    }

    async fn fetch_reciters(&self) -> Result<Vec<Reciter>, ContentError> {
        let response: RecitationsResponse =
            self.get_json("/resources/recitations", &[]).await?;
        Ok(response.recitations.into_iter().map(Reciter::from).collect())
    }

    async fn fetch_translations(&self) -> Result<Vec<Translation>, ContentError> {
        let response: TranslationsResponse =
            self.get_json("/resources/translations", &[]).await?;
        let mut translations: Vec<Translation> = response
            .translations
            .into_iter()
            .map(Translation::from)
            .collect();
        translations.sort_by(|a, b| a.language.cmp(&b.language).then(a.name.cmp(&b.name)));
        Ok(translations)
    }

    async fn fetch_verses(
        &self,
        chapter: u32,
        start: u32,
        end: u32,
        translation: Option<u32>,
    ) -> Result<BTreeMap<u32, VerseText>, ContentError> {
        let path = format!("/verses/by_chapter/{}", chapter);
        let path = path.as_str();

        let verses = walk_pages(start, end, |page| {
            let mut query = vec![
                ("fields", "text_uthmani".to_string()),
                ("per_page", VERSES_PER_PAGE.to_string()),
                ("page", page.to_string()),
            ];
            if let Some(id) = translation {
                query.push(("translations", id.to_string()));
            }
            async move { self.get_json::<VersesResponse>(path, &query).await }
        })
        .await?;

        tracing::debug!(
            chapter,
            start,
            end,
            found = verses.len(),
            "Fetched verse text"
        );
        Ok(verses)
    }

    async fn fetch_audio_url(
        &self,
        reciter: u32,
        chapter: u32,
        verse: u32,
    ) -> Result<Option<String>, ContentError> {
        let path = format!("/recitations/{}/by_ayah/{}:{}", reciter, chapter, verse);
        let response: AudioFilesResponse = self.get_json(&path, &[]).await?;
        Ok(response
            .audio_files
            .into_iter()
            .next()
            .map(|file| resolve_audio_url(&self.audio_base_url, &file.url)))
    }
}

impl From<ApiChapter> for Chapter {
    fn from(api: ApiChapter) -> Self {
        Chapter {
            id: api.id,
            display_name: api.name_simple,
            native_name: api.name_arabic,
            verse_count: api.verses_count,
        }
    }
}

impl From<ApiRecitation> for Reciter {
    fn from(api: ApiRecitation) -> Self {
        Reciter {
            id: api.id,
            name: api.reciter_name,
            style: api.style,
        }
    }
}

impl From<ApiTranslation> for Translation {
    fn from(api: ApiTranslation) -> Self {
        Translation {
            id: api.id,
            name: api.name,
            author: api.author_name,
            language: api.language_name,
        }
    }
}

/// Collect `start..=end` from consecutive pages, starting at the page holding
/// `start` and stopping once a page reaches `end` or there is no next page
async fn walk_pages<F, Fut>(
    start: u32,
    end: u32,
    mut fetch_page: F,
) -> Result<BTreeMap<u32, VerseText>, ContentError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<VersesResponse, ContentError>>,
{
    let mut verses = BTreeMap::new();
    let mut page = first_page_for(start);

    for _ in 0..MAX_PAGES {
        let response = fetch_page(page).await?;
        let last_on_page = collect_verses(response.verses, start, end, &mut verses);

        match response.pagination.and_then(|p| p.next_page) {
            Some(next) if last_on_page.map_or(true, |last| last < end) => page = next,
            _ => break,
        }
    }

    Ok(verses)
}

/// Page of `/verses/by_chapter` holding verse `start`
fn first_page_for(start: u32) -> u32 {
    start.saturating_sub(1) / VERSES_PER_PAGE + 1
}

/// Keep verses in `start..=end`; returns the highest verse number seen on the page
fn collect_verses(
    page: Vec<ApiVerse>,
    start: u32,
    end: u32,
    into: &mut BTreeMap<u32, VerseText>,
) -> Option<u32> {
    let mut last = None;
    for verse in page {
        last = last.max(Some(verse.verse_number));
        if verse.verse_number < start || verse.verse_number > end {
            continue;
        }
        let Some(arabic_text) = verse.text_uthmani else {
            tracing::warn!(verse = verse.verse_number, "Verse without text_uthmani");
            continue;
        };
        let translation_text = verse
            .translations
            .into_iter()
            .next()
            .map(|t| strip_markup(&t.text))
            .filter(|t| !t.is_empty());
        into.insert(
            verse.verse_number,
            VerseText {
                arabic_text,
                translation_text,
            },
        );
    }
    last
}

/// Make an API audio path absolute
///
/// The API returns paths relative to the audio CDN for most reciters and
/// protocol-relative URLs for a few.
pub fn resolve_audio_url(audio_base_url: &str, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else if let Some(rest) = url.strip_prefix("//") {
        format!("https://{}", rest)
    } else {
        format!(
            "{}/{}",
            audio_base_url.trim_end_matches('/'),
            url.trim_start_matches('/')
        )
    }
}

/// Plain text from translation markup: footnote markers are dropped with
/// their content, other tags are removed, entities decoded
pub fn strip_markup(text: &str) -> String {
    let text = FOOTNOTE_RE.replace_all(text, "");
    let text = TAG_RE.replace_all(&text, "");
    let text = html_escape::decode_html_entities(&text);
    WHITESPACE_RE.replace_all(text.trim(), " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = QuranComClient::new(&ContentConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_first_page_for() {
        assert_eq!(first_page_for(1), 1);
        assert_eq!(first_page_for(50), 1);
        assert_eq!(first_page_for(51), 2);
        assert_eq!(first_page_for(255), 6);
    }

    #[test]
    fn test_resolve_audio_url() {
        let base = "https://verses.quran.com/";
        assert_eq!(
            resolve_audio_url(base, "Alafasy/mp3/001001.mp3"),
            "https://verses.quran.com/Alafasy/mp3/001001.mp3"
        );
        assert_eq!(
            resolve_audio_url(base, "//mirrors.quranicaudio.com/everyayah/Husary/001001.mp3"),
            "https://mirrors.quranicaudio.com/everyayah/Husary/001001.mp3"
        );
        assert_eq!(
            resolve_audio_url("http://cdn.test", "https://verses.quran.com/a.mp3"),
            "https://verses.quran.com/a.mp3"
        );
        assert_eq!(
            resolve_audio_url("http://cdn.test", "/a/b.mp3"),
            "http://cdn.test/a/b.mp3"
        );
    }

    #[test]
    fn test_strip_markup_removes_footnotes() {
        let raw = "All praise is for Allah<sup foot_note=\"77\">1</sup>&mdash;Lord of all worlds,";
        assert_eq!(strip_markup(raw), "All praise is for Allah\u{2014}Lord of all worlds,");
    }

    #[test]
    fn test_strip_markup_removes_other_tags() {
        assert_eq!(
            strip_markup("<i>Guide</i> us along the  Straight Path"),
            "Guide us along the Straight Path"
        );
        assert_eq!(strip_markup("plain"), "plain");
        assert_eq!(strip_markup("broken <tag"), "broken <tag");
    }

    #[test]
    fn test_parse_chapters() {
        let json = r#"{"chapters":[{"id":1,"revelation_place":"makkah","revelation_order":5,
            "bismillah_pre":false,"name_simple":"Al-Fatihah","name_complex":"Al-Fātiĥah",
            "name_arabic":"الفاتحة","verses_count":7,"pages":[1,1],
            "translated_name":{"language_name":"english","name":"The Opener"}}]}"#;
        let response: ChaptersResponse = serde_json::from_str(json).unwrap();
        let chapter = Chapter::from(response.chapters.into_iter().next().unwrap());
        assert_eq!(chapter.id, 1);
        assert_eq!(chapter.display_name, "Al-Fatihah");
        assert_eq!(chapter.native_name, "الفاتحة");
        assert_eq!(chapter.verse_count, 7);
    }

    #[test]
    fn test_parse_recitations_with_null_style() {
        let json = r#"{"recitations":[
            {"id":7,"reciter_name":"Mishari Rashid al-`Afasy","style":null,
             "translated_name":{"name":"Mishari Rashid al-`Afasy","language_name":"english"}},
            {"id":1,"reciter_name":"AbdulBaset AbdulSamad","style":"Mujawwad"}]}"#;
        let response: RecitationsResponse = serde_json::from_str(json).unwrap();
        let reciters: Vec<Reciter> = response.recitations.into_iter().map(Reciter::from).collect();
        assert_eq!(reciters[0].style, None);
        assert_eq!(reciters[1].label(), "AbdulBaset AbdulSamad (Mujawwad)");
    }

    #[test]
    fn test_parse_translations() {
        let json = r#"{"translations":[{"id":131,"name":"Dr. Mustafa Khattab, The Clear Quran",
            "author_name":"Dr. Mustafa Khattab","slug":"clearquran-with-tafsir",
            "language_name":"english","translated_name":{"name":"x","language_name":"english"}}]}"#;
        let response: TranslationsResponse = serde_json::from_str(json).unwrap();
        let translation = Translation::from(response.translations.into_iter().next().unwrap());
        assert_eq!(translation.id, 131);
        assert_eq!(translation.language, "english");
        assert_eq!(translation.author.as_deref(), Some("Dr. Mustafa Khattab"));
    }

    #[test]
    fn test_collect_verses_filters_range_and_strips_translation() {
        let json = r#"{"verses":[
            {"id":1,"verse_number":1,"verse_key":"1:1","text_uthmani":"بِسْمِ","translations":[]},
            {"id":2,"verse_number":2,"verse_key":"1:2","text_uthmani":"ٱلْحَمْدُ",
             "translations":[{"id":1,"resource_id":131,"text":"All praise<sup foot_note=\"1\">1</sup> is for Allah"}]},
            {"id":3,"verse_number":3,"verse_key":"1:3","text_uthmani":"ٱلرَّحْمَـٰنِ"}],
            "pagination":{"per_page":50,"current_page":1,"next_page":null,"total_pages":1,"total_records":7}}"#;
        let response: VersesResponse = serde_json::from_str(json).unwrap();
        let mut verses = BTreeMap::new();
        let last = collect_verses(response.verses, 2, 3, &mut verses);

        assert_eq!(last, Some(3));
        assert_eq!(verses.keys().copied().collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(
            verses[&2].translation_text.as_deref(),
            Some("All praise is for Allah")
        );
        assert_eq!(verses[&3].translation_text, None);
        assert!(response.pagination.unwrap().next_page.is_none());
    }

    fn page(verses: std::ops::RangeInclusive<u32>, next_page: Option<u32>) -> VersesResponse {
        VersesResponse {
            verses: verses
                .map(|n| ApiVerse {
                    verse_number: n,
                    text_uthmani: Some(format!("text {}", n)),
                    translations: vec![],
                })
                .collect(),
            pagination: Some(ApiPagination { next_page }),
        }
    }

    /// Chapter 2 as served 50 verses per page
    fn chapter_two_page(number: u32) -> Result<VersesResponse, ContentError> {
        match number {
            1 => Ok(page(1..=50, Some(2))),
            2 => Ok(page(51..=100, Some(3))),
            3 => Ok(page(101..=150, Some(4))),
            other => Err(ContentError::NotFound(format!("page {}", other))),
        }
    }

    #[tokio::test]
    async fn test_walk_pages_crosses_page_boundary() {
        let mut requested = Vec::new();
        let verses = walk_pages(45, 60, |number| {
            requested.push(number);
            std::future::ready(chapter_two_page(number))
        })
        .await
        .unwrap();

        assert_eq!(verses.keys().copied().collect::<Vec<_>>(), (45..=60).collect::<Vec<_>>());
        assert_eq!(verses[&51].arabic_text, "text 51");
        // Page 2 already reaches verse 60
        assert_eq!(requested, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_walk_pages_starts_at_page_holding_start() {
        let mut requested = Vec::new();
        let verses = walk_pages(55, 60, |number| {
            requested.push(number);
            std::future::ready(chapter_two_page(number))
        })
        .await
        .unwrap();

        assert_eq!(verses.len(), 6);
        assert_eq!(requested, vec![2]);
    }

    #[tokio::test]
    async fn test_walk_pages_stops_at_last_page() {
        // Range past the end of a 7-verse chapter
        let mut requested = Vec::new();
        let verses = walk_pages(5, 9, |number| {
            requested.push(number);
            std::future::ready(Ok(page(1..=7, None)))
        })
        .await
        .unwrap();

        assert_eq!(verses.keys().copied().collect::<Vec<_>>(), vec![5, 6, 7]);
        assert_eq!(requested, vec![1]);
    }

    #[tokio::test]
    async fn test_walk_pages_propagates_page_error() {
        let result = walk_pages(45, 120, |number| {
            std::future::ready(match number {
                1 => Ok(page(1..=50, Some(2))),
                _ => Err(ContentError::ApiError(500, "boom".to_string())),
            })
        })
        .await;

        assert!(matches!(result, Err(ContentError::ApiError(500, _))));
    }

    #[test]
    fn test_strip_markup_footnote_with_nested_markup() {
        let raw = "Lord<sup foot_note=\"9\"><i>2</i></sup> of all\nworlds&nbsp;";
        assert_eq!(strip_markup(raw), "Lord of all worlds");
    }

    #[test]
    fn test_parse_audio_files() {
        let json = r#"{"audio_files":[{"verse_key":"1:1","url":"Alafasy/mp3/001001.mp3"}],
            "pagination":{"per_page":10,"current_page":1,"next_page":null,"total_pages":1,"total_records":1}}"#;
        let response: AudioFilesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.audio_files[0].url, "Alafasy/mp3/001001.mp3");
    }
}
