//! The package stylesheet.

const MAIN_CSS: &str = r#"*, *::before, *::after { box-sizing: border-box; }

html, body {
  margin: 0;
  padding: 0;
  font-family: system-ui, -apple-system, "Segoe UI", Roboto, sans-serif;
  line-height: 1.5;
  color: #1f2933;
  background: #f5f7fa;
}

/* Entry shell */
.course-shell {
  display: flex;
  flex-direction: column;
  min-height: 100vh;
}
.course-header {
  padding: 1rem 1.5rem 0.75rem;
  background: #243b53;
  color: #fff;
}
.course-title { margin: 0; font-size: 1.4rem; }
.course-description { margin: 0.25rem 0 0; opacity: 0.85; }
.progress {
  margin-top: 0.75rem;
  height: 0.4rem;
  background: rgba(255, 255, 255, 0.25);
  border-radius: 0.2rem;
  overflow: hidden;
}
.progress-fill {
  width: 0;
  height: 100%;
  background: #3ebd93;
  transition: width 0.3s ease;
}
.course-body {
  display: flex;
  flex: 1;
  min-height: 0;
}
#course-outline {
  width: 16rem;
  flex-shrink: 0;
  padding: 1rem;
  background: #fff;
  border-right: 1px solid #d9e2ec;
  overflow-y: auto;
}
#course-outline ol { margin: 0; padding-left: 1.25rem; }
#course-outline li { margin: 0.35rem 0; }
#course-outline a { color: #334e68; text-decoration: none; }
#course-outline a.current { font-weight: 600; color: #102a43; }
#course-outline a.locked { color: #9fb3c8; cursor: not-allowed; }
#course-outline a.visited::after { content: " \2713"; color: #3ebd93; }
#content-container {
  flex: 1;
  display: flex;
}
#content-frame {
  flex: 1;
  width: 100%;
  border: 0;
  background: #fff;
}
#scorm-alert-container:empty { display: none; }
#scorm-alert-container {
  margin: 0;
  padding: 0.75rem 1.5rem;
  background: #fff3c4;
  color: #8d2b0b;
  border-top: 1px solid #f0b429;
}
.course-footer {
  display: flex;
  align-items: center;
  justify-content: space-between;
  padding: 0.75rem 1.5rem;
  background: #fff;
  border-top: 1px solid #d9e2ec;
}

button {
  font: inherit;
  padding: 0.5rem 1.1rem;
  border: 0;
  border-radius: 0.3rem;
  background: #2680c2;
  color: #fff;
  cursor: pointer;
}
button:disabled { background: #9fb3c8; cursor: not-allowed; }
button:focus-visible { outline: 3px solid #f0b429; outline-offset: 2px; }

/* Page documents */
.page {
  background: #fff;
}
.page-content {
  max-width: 48rem;
  margin: 0 auto;
  padding: 1.5rem;
}
.page-title { margin-top: 0; }
.page-body img { max-width: 100%; height: auto; }
.page-media { margin-bottom: 1.5rem; }
.media { margin: 0 0 1rem; }
.media img, .media video { max-width: 100%; height: auto; }
.media iframe { width: 100%; aspect-ratio: 16 / 9; border: 0; }
.media figcaption { font-size: 0.9rem; color: #627d98; }
.narration { display: block; width: 100%; margin: 0.5rem 0; }
.objectives-list li { margin: 0.3rem 0; }
.start-course { margin-top: 1rem; }

.knowledge-check, .assessment {
  margin-top: 2rem;
  padding: 1rem 1.25rem;
  border: 1px solid #d9e2ec;
  border-radius: 0.4rem;
  background: #f8fafc;
}
.knowledge-check h2 { margin-top: 0; font-size: 1.15rem; }
.question { margin: 1rem 0 1.5rem; }
.question-prompt { font-weight: 600; }
.question-option { display: block; margin: 0.3rem 0; cursor: pointer; }
.fill-answer {
  font: inherit;
  padding: 0.4rem 0.6rem;
  border: 1px solid #bcccdc;
  border-radius: 0.3rem;
  min-width: 16rem;
}
.question-feedback:empty { display: none; }
.question-feedback {
  margin-top: 0.6rem;
  padding: 0.5rem 0.75rem;
  border-radius: 0.3rem;
}
.question-feedback.correct { background: #e3f9e5; color: #05400a; }
.question-feedback.incorrect { background: #ffe3e3; color: #610404; }
.question.answered .check-answer { display: none; }
.pass-mark { color: #486581; }
.assessment-result:empty { display: none; }
.assessment-result {
  margin-top: 1rem;
  padding: 0.75rem 1rem;
  border-radius: 0.3rem;
  font-weight: 600;
}
.assessment-result.passed { background: #e3f9e5; color: #05400a; }
.assessment-result.failed { background: #ffe3e3; color: #610404; }

@media (max-width: 48rem) {
  .course-body { flex-direction: column; }
  #course-outline {
    width: auto;
    border-right: 0;
    border-bottom: 1px solid #d9e2ec;
  }
}
"#;

/// Stylesheet shared by the entry shell and every page document.
pub(super) fn stylesheet() -> String {
    MAIN_CSS.to_string()
}
