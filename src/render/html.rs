//! Page documents and the entry shell.

use std::collections::BTreeSet;

use super::{ENTRY_PATH, RenderOptions, SCRIPT_ORDER, STRICT_CONTENT_POLICY, STYLESHEET_PATH};
use crate::media::page_media;
use crate::model::{
    CourseContent, MediaKind, MediaRef, Page, PageKind, Question, QuestionKind, ResolvedEntry,
    ResolvedMedia,
};
use crate::navigation::question_key;
use crate::util::{escape_attr, escape_text};

/// Relative prefix from a page document back to the archive root.
const PAGE_ROOT: &str = "../";

/// Embed URL for a YouTube watch or short link. Embed links pass through.
pub fn youtube_embed_url(url: &str) -> Option<String> {
    let url = url.trim();
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;
    let rest = rest.strip_prefix("www.").unwrap_or(rest);
    let rest = rest.strip_prefix("m.").unwrap_or(rest);

    let id = if let Some(path) = rest.strip_prefix("youtube.com/embed/") {
        path
    } else if let Some(path) = rest.strip_prefix("youtube-nocookie.com/embed/") {
        path
    } else if let Some(path) = rest.strip_prefix("youtu.be/") {
        path
    } else if let Some(query) = rest.strip_prefix("youtube.com/watch?") {
        query
            .split('&')
            .find_map(|pair| pair.strip_prefix("v="))?
    } else {
        return None;
    };

    let id: &str = id.split(['?', '&', '#', '/']).next().unwrap_or_default();
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    valid.then(|| format!("https://www.youtube.com/embed/{id}"))
}

fn head(html: &mut String, title: &str, root: &str, options: &RenderOptions) {
    html.push_str("<!DOCTYPE html>\n");
    html.push_str("<html lang=\"en\">\n");
    html.push_str("<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    if options.strict_content_policy {
        html.push_str(&format!(
            "<meta http-equiv=\"Content-Security-Policy\" content=\"{}\">\n",
            escape_attr(STRICT_CONTENT_POLICY)
        ));
    }
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!("<title>{}</title>\n", escape_text(title)));
    html.push_str(&format!(
        "<link rel=\"stylesheet\" href=\"{root}{STYLESHEET_PATH}\">\n"
    ));
    html.push_str("</head>\n");
}

fn scripts(html: &mut String, root: &str) {
    for script in SCRIPT_ORDER {
        html.push_str(&format!("<script src=\"{root}{script}\"></script>\n"));
    }
}

/// Render one page document.
///
/// Every file-backed media item the page shows is recorded in `media_used`.
pub(super) fn render_page(
    content: &CourseContent,
    page: &Page,
    media: &ResolvedMedia,
    options: &RenderOptions,
    media_used: &mut BTreeSet<crate::model::MediaKey>,
) -> String {
    let mut html = String::with_capacity(4096);
    head(
        &mut html,
        &format!("{} - {}", page.title, content.title),
        PAGE_ROOT,
        options,
    );

    let kind = match page.kind {
        PageKind::Welcome => "welcome",
        PageKind::Objectives => "objectives",
        PageKind::Topic => "topic",
        PageKind::Assessment => "assessment",
    };
    html.push_str(&format!("<body class=\"page page-{kind}\">\n"));
    html.push_str(&format!(
        "<main class=\"page-content\" data-page-id=\"{}\">\n",
        escape_attr(page.id.as_str())
    ));
    html.push_str(&format!(
        "<h1 class=\"page-title\">{}</h1>\n",
        escape_text(&page.title)
    ));

    render_media(&mut html, &page_media(content, page), media, media_used);

    if !page.body.is_empty() {
        html.push_str("<div class=\"page-body\">\n");
        html.push_str(page.body.as_str());
        html.push_str("\n</div>\n");
    }

    if page.kind == PageKind::Assessment {
        render_assessment(&mut html, page, options);
    } else {
        render_knowledge_check(&mut html, page);
    }

    if page.kind == PageKind::Welcome {
        let label = page.start_label.as_deref().unwrap_or("Start Course");
        html.push_str(&format!(
            "<button type=\"button\" class=\"start-course\" data-action=\"next\">{}</button>\n",
            escape_text(label)
        ));
    }

    html.push_str("</main>\n");
    scripts(&mut html, PAGE_ROOT);
    html.push_str("</body>\n</html>\n");

    tracing::debug!(page = %page.id, bytes = html.len(), "rendered page");
    html
}

fn render_knowledge_check(html: &mut String, page: &Page) {
    let Some(check) = &page.knowledge_check else {
        return;
    };
    if check.questions.is_empty() {
        return;
    }
    html.push_str(&format!(
        "<section class=\"knowledge-check\" data-page-id=\"{}\">\n",
        escape_attr(page.id.as_str())
    ));
    html.push_str("<h2>Knowledge Check</h2>\n");
    for (i, question) in check.questions.iter().enumerate() {
        render_question(html, page, i, question, true);
    }
    html.push_str("</section>\n");
}

fn render_assessment(html: &mut String, page: &Page, options: &RenderOptions) {
    html.push_str(&format!(
        "<section class=\"assessment\" data-page-id=\"{}\" data-pass-mark=\"{}\">\n",
        escape_attr(page.id.as_str()),
        options.pass_mark
    ));
    html.push_str(&format!(
        "<p class=\"pass-mark\">You need {}% to pass.</p>\n",
        options.pass_mark
    ));
    if let Some(check) = &page.knowledge_check {
        for (i, question) in check.questions.iter().enumerate() {
            render_question(html, page, i, question, false);
        }
    }
    html.push_str("<button type=\"button\" class=\"submit-assessment\">Submit Assessment</button>\n");
    html.push_str("<div class=\"assessment-result\" aria-live=\"polite\"></div>\n");
    html.push_str("</section>\n");
}

fn render_question(html: &mut String, page: &Page, index: usize, question: &Question, checkable: bool) {
    let key = question_key(&page.id, index);
    let key_attr = escape_attr(&key);
    html.push_str(&format!(
        "<div class=\"question\" data-question-key=\"{key_attr}\" data-kind=\"{}\">\n",
        question.kind.as_str()
    ));
    html.push_str(&format!(
        "<p class=\"question-prompt\">{}</p>\n",
        escape_text(&question.prompt)
    ));

    match question.kind {
        QuestionKind::MultipleChoice | QuestionKind::TrueFalse => {
            html.push_str("<div class=\"question-options\">\n");
            for option in &question.options {
                html.push_str(&format!(
                    "<label class=\"question-option\"><input type=\"radio\" name=\"{key_attr}\" value=\"{}\"> {}</label>\n",
                    escape_attr(option),
                    escape_text(option)
                ));
            }
            html.push_str("</div>\n");
        }
        QuestionKind::FillInTheBlank => {
            html.push_str(&format!(
                "<input type=\"text\" class=\"fill-answer\" name=\"{key_attr}\" aria-label=\"Your answer\" autocomplete=\"off\">\n"
            ));
        }
    }

    if checkable {
        html.push_str("<button type=\"button\" class=\"check-answer\">Check Answer</button>\n");
    }
    html.push_str("<div class=\"question-feedback\" aria-live=\"polite\"></div>\n");
    html.push_str("</div>\n");
}

/// Page media: images and videos in declared order, then narration.
fn render_media(
    html: &mut String,
    refs: &[MediaRef],
    media: &ResolvedMedia,
    media_used: &mut BTreeSet<crate::model::MediaKey>,
) {
    let mut src_of = |m: &MediaRef| -> Option<String> {
        match media.get(&m.key())? {
            ResolvedEntry::File(asset) => {
                media_used.insert(m.key());
                Some(format!("{PAGE_ROOT}{}", asset.path))
            }
            ResolvedEntry::Embed { url } => Some(url.clone()),
        }
    };

    let mut figures = String::new();
    let mut audio: Vec<(String, &MediaRef)> = Vec::new();
    let mut captions: Vec<String> = Vec::new();

    for m in refs {
        let Some(src) = src_of(m) else {
            continue;
        };
        let title = escape_attr(&m.title);
        match m.kind {
            MediaKind::Image => {
                figures.push_str("<figure class=\"media media-image\">\n");
                figures.push_str(&format!(
                    "<img src=\"{}\" alt=\"{title}\">\n",
                    escape_attr(&src)
                ));
                if !m.title.is_empty() {
                    figures.push_str(&format!(
                        "<figcaption>{}</figcaption>\n",
                        escape_text(&m.title)
                    ));
                }
                figures.push_str("</figure>\n");
            }
            MediaKind::Video if m.embed_url.is_some() || is_embed(media, m) => {
                let player = youtube_embed_url(&src).unwrap_or(src);
                figures.push_str("<figure class=\"media media-video\">\n");
                figures.push_str(&format!(
                    "<iframe src=\"{}\" title=\"{title}\" allow=\"encrypted-media; picture-in-picture\" allowfullscreen></iframe>\n",
                    escape_attr(&player)
                ));
                figures.push_str("</figure>\n");
            }
            MediaKind::Video => {
                figures.push_str("<figure class=\"media media-video\">\n");
                figures.push_str(&format!(
                    "<video controls preload=\"metadata\" src=\"{}\" title=\"{title}\"></video>\n",
                    escape_attr(&src)
                ));
                figures.push_str("</figure>\n");
            }
            MediaKind::Audio => audio.push((src, m)),
            MediaKind::Caption => captions.push(src),
        }
    }

    if figures.is_empty() && audio.is_empty() && captions.is_empty() {
        return;
    }

    html.push_str("<section class=\"page-media\">\n");
    html.push_str(&figures);

    let mut captions = captions.into_iter();
    for (src, m) in &audio {
        html.push_str(&format!(
            "<audio class=\"narration\" controls preload=\"none\" src=\"{}\"",
            escape_attr(src)
        ));
        if !m.title.is_empty() {
            html.push_str(&format!(" title=\"{}\"", escape_attr(&m.title)));
        }
        html.push_str(">\n");
        if let Some(track) = captions.next() {
            html.push_str(&format!(
                "<track kind=\"captions\" src=\"{}\" srclang=\"en\" label=\"Captions\" default>\n",
                escape_attr(&track)
            ));
        }
        html.push_str("</audio>\n");
    }
    for transcript in captions {
        html.push_str(&format!(
            "<p class=\"transcript\"><a href=\"{}\">Transcript</a></p>\n",
            escape_attr(&transcript)
        ));
    }
    html.push_str("</section>\n");
}

fn is_embed(media: &ResolvedMedia, m: &MediaRef) -> bool {
    matches!(media.get(&m.key()), Some(ResolvedEntry::Embed { .. }))
}

/// Render the entry shell: outline, progress, content frame and controls.
pub(super) fn render_entry(content: &CourseContent, options: &RenderOptions) -> String {
    let mut html = String::with_capacity(4096);
    head(&mut html, &content.title, "", options);

    html.push_str(&format!(
        "<body class=\"course-shell\" data-scorm-version=\"{}\">\n",
        options.scorm_version.as_str()
    ));
    html.push_str("<header class=\"course-header\">\n");
    html.push_str(&format!(
        "<h1 class=\"course-title\">{}</h1>\n",
        escape_text(&content.title)
    ));
    if let Some(description) = &content.description {
        html.push_str(&format!(
            "<p class=\"course-description\">{}</p>\n",
            escape_text(description)
        ));
    }
    html.push_str(
        "<div class=\"progress\" role=\"progressbar\" aria-valuemin=\"0\" aria-valuemax=\"100\" aria-valuenow=\"0\"><div class=\"progress-fill\" id=\"progress-fill\"></div></div>\n",
    );
    html.push_str("</header>\n");

    html.push_str("<div class=\"course-body\">\n");
    html.push_str("<nav id=\"course-outline\" aria-label=\"Course outline\">\n<ol>\n");
    for page in &content.pages {
        html.push_str(&format!(
            "<li><a href=\"{}\" data-page=\"{}\" target=\"content-frame\">{}</a></li>\n",
            escape_attr(&page.id.document_path()),
            escape_attr(page.id.as_str()),
            escape_text(&page.title)
        ));
    }
    html.push_str("</ol>\n</nav>\n");

    html.push_str("<main id=\"content-container\">\n");
    html.push_str("<iframe id=\"content-frame\" name=\"content-frame\" title=\"Course content\"");
    if let Some(first) = content.pages.first() {
        html.push_str(&format!(" src=\"{}\"", escape_attr(&first.id.document_path())));
    }
    html.push_str("></iframe>\n");
    html.push_str("</main>\n");
    html.push_str("</div>\n");

    html.push_str("<div id=\"scorm-alert-container\" role=\"alert\" aria-live=\"assertive\"></div>\n");
    html.push_str("<footer class=\"course-footer\">\n");
    html.push_str("<button type=\"button\" id=\"prev-button\" disabled>Previous</button>\n");
    html.push_str(&format!(
        "<span id=\"page-indicator\">1 / {}</span>\n",
        content.pages.len()
    ));
    html.push_str("<button type=\"button\" id=\"next-button\">Next</button>\n");
    html.push_str("</footer>\n");
    scripts(&mut html, "");
    html.push_str("</body>\n</html>\n");

    tracing::debug!(path = ENTRY_PATH, bytes = html.len(), "rendered entry shell");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScormVersion;
    use crate::model::{
        KnowledgeCheck, MediaKey, PageId, ResolvedAsset, SafeHtml,
    };

    fn options(strict: bool) -> RenderOptions {
        RenderOptions {
            scorm_version: ScormVersion::Scorm2004,
            strict_content_policy: strict,
            pass_mark: 80,
        }
    }

    fn course() -> CourseContent {
        let mut welcome = Page::new(PageId::welcome(), PageKind::Welcome, "Welcome");
        welcome.start_label = Some("Begin <now>".into());
        let mut topic = Page::new(PageId::topic(0), PageKind::Topic, "Fire & Ice");
        topic.body = SafeHtml::from_sanitized("<p>Body</p>".to_string());
        topic.knowledge_check = Some(KnowledgeCheck {
            questions: vec![Question::true_false("Is it hot?", true)],
        });
        CourseContent {
            title: "Safety".into(),
            description: None,
            pass_mark: 80,
            pages: vec![welcome, topic],
        }
    }

    fn audio_asset(path: &str) -> ResolvedEntry {
        ResolvedEntry::File(ResolvedAsset {
            path: path.into(),
            byte_len: 3,
            mime_type: "audio/mpeg".into(),
            data: vec![1, 2, 3],
        })
    }

    #[test]
    fn test_youtube_embed_url() {
        assert_eq!(
            youtube_embed_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=10"),
            Some("https://www.youtube.com/embed/dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            youtube_embed_url("https://youtu.be/dQw4w9WgXcQ?si=x"),
            Some("https://www.youtube.com/embed/dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            youtube_embed_url("https://www.youtube.com/embed/abc123"),
            Some("https://www.youtube.com/embed/abc123".to_string())
        );
        assert_eq!(youtube_embed_url("https://vimeo.com/1234"), None);
    }

    #[test]
    fn test_title_escaped_once() {
        let content = course();
        let mut used = BTreeSet::new();
        let html = render_page(&content, &content.pages[1], &ResolvedMedia::new(), &options(false), &mut used);
        assert!(html.contains("<h1 class=\"page-title\">Fire &amp; Ice</h1>"));
        assert!(!html.contains("&amp;amp;"));
        assert!(html.contains("<p>Body</p>"));
    }

    #[test]
    fn test_question_markup() {
        let content = course();
        let mut used = BTreeSet::new();
        let html = render_page(&content, &content.pages[1], &ResolvedMedia::new(), &options(false), &mut used);
        assert!(html.contains("data-question-key=\"topic-0:0\""));
        assert!(html.contains("data-kind=\"true-false\""));
        assert!(html.contains("value=\"True\""));
        assert!(html.contains("class=\"check-answer\""));
    }

    #[test]
    fn test_welcome_check_renders_before_start() {
        let mut content = course();
        content.pages[0].knowledge_check = Some(KnowledgeCheck {
            questions: vec![Question::true_false("Ready?", true)],
        });
        let mut used = BTreeSet::new();
        let html = render_page(&content, &content.pages[0], &ResolvedMedia::new(), &options(false), &mut used);
        let check = html.find("data-question-key=\"welcome:0\"").unwrap();
        let start = html.find("class=\"start-course\"").unwrap();
        assert!(check < start);
        assert!(html.contains("class=\"check-answer\""));
    }

    #[test]
    fn test_scripts_load_shim_first() {
        let content = course();
        let html = render_entry(&content, &options(false));
        let shim = html.find("scripts/scorm-api.js").unwrap();
        let nav = html.find("scripts/navigation.js").unwrap();
        assert!(shim < nav);
        assert!(!html.contains("<script>"));
        assert!(!html.contains("<style"));
    }

    #[test]
    fn test_content_policy_only_when_strict() {
        let content = course();
        assert!(!render_entry(&content, &options(false)).contains("Content-Security-Policy"));
        assert!(render_entry(&content, &options(true)).contains("Content-Security-Policy"));
    }

    #[test]
    fn test_entry_shell_outline() {
        let content = course();
        let html = render_entry(&content, &options(false));
        assert!(html.contains("href=\"pages/topic-0.html\" data-page=\"topic-0\""));
        assert!(html.contains("id=\"content-frame\""));
        assert!(html.contains("src=\"pages/welcome.html\""));
        assert!(html.contains("id=\"scorm-alert-container\""));
        assert!(html.contains("<span id=\"page-indicator\">1 / 2</span>"));
    }

    #[test]
    fn test_narration_with_captions() {
        let content = course();
        let mut media = ResolvedMedia::new();
        media.insert(MediaKey::new("audio-0", MediaKind::Audio), audio_asset("media/audio/audio-0.mp3"));
        media.insert(
            MediaKey::new("caption-0", MediaKind::Caption),
            audio_asset("media/captions/caption-0.vtt"),
        );
        let mut used = BTreeSet::new();
        let html = render_page(&content, &content.pages[0], &media, &options(false), &mut used);
        assert!(html.contains("src=\"../media/audio/audio-0.mp3\""));
        assert!(html.contains("<track kind=\"captions\" src=\"../media/captions/caption-0.vtt\""));
        assert_eq!(used.len(), 2);
        assert!(html.contains("Begin &lt;now&gt;"));
    }

    #[test]
    fn test_missing_media_skipped() {
        let content = course();
        let mut used = BTreeSet::new();
        let html = render_page(&content, &content.pages[0], &ResolvedMedia::new(), &options(false), &mut used);
        assert!(!html.contains("<audio"));
        assert!(used.is_empty());
    }

    #[test]
    fn test_video_embed_uses_iframe() {
        let mut content = course();
        content.pages[1].media.push(
            MediaRef::new("video-a", MediaKind::Video)
                .with_embed_url("https://youtu.be/abc_123")
                .with_title("Intro"),
        );
        let mut media = ResolvedMedia::new();
        media.insert(
            MediaKey::new("video-a", MediaKind::Video),
            ResolvedEntry::Embed {
                url: "https://youtu.be/abc_123".into(),
            },
        );
        let mut used = BTreeSet::new();
        let html = render_page(&content, &content.pages[1], &media, &options(false), &mut used);
        assert!(html.contains("<iframe src=\"https://www.youtube.com/embed/abc_123\" title=\"Intro\""));
        assert!(used.is_empty());
    }
}
