//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! crawl loop end-to-end into a temporary output directory.

use offline_mirror::config::{Config, CrawlerConfig};
use offline_mirror::crawler::Coordinator;
use offline_mirror::output::BOOKMARKS_PAGE_FILE;
use offline_mirror::state::{CrawlState, CrawlStateStore, STATE_FILE};
use offline_mirror::CrawlPhase;
use scraper::{Html, Selector};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html; charset=utf-8")
}

fn bytes(body: &[u8], content_type: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_vec(), content_type)
}

async fn mount(server: &MockServer, at: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(response)
        .mount(server)
        .await;
}

async fn mount_once(server: &MockServer, at: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

fn test_config(start_url: &str, output: &Path) -> Config {
    Config::new(start_url, output, CrawlerConfig::default()).expect("valid test config")
}

async fn crawl(start_url: &str, output: &Path) -> offline_mirror::CrawlReport {
    Coordinator::new(test_config(start_url, output), false)
        .expect("coordinator")
        .run()
        .await
        .expect("crawl")
}

/// Reads every mirrored file (excluding crawl bookkeeping) into a map
fn snapshot(root: &Path) -> BTreeMap<String, Vec<u8>> {
    fn walk(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<u8>>) {
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(&path, root, out);
            } else {
                let name = path.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/");
                if !name.starts_with("bookmarks.db") {
                    out.insert(name, std::fs::read(&path).unwrap());
                }
            }
        }
    }

    let mut out = BTreeMap::new();
    walk(root, root, &mut out);
    out
}

fn attrs(html: &str, selector: &str, attr: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(selector).unwrap();
    document
        .select(&selector)
        .filter_map(|e| e.value().attr(attr))
        .map(str::to_string)
        .collect()
}

fn read(root: &Path, relative: &str) -> String {
    std::fs::read_to_string(root.join(relative))
        .unwrap_or_else(|e| panic!("reading {}: {}", relative, e))
}

#[tokio::test]
async fn test_full_crawl_single_domain() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount(
        &server,
        "/",
        html(
            r#"<html><head><title>Home</title><link rel="stylesheet" href="/static/site.css"></head>
            <body>
                <img src="/img/logo.png">
                <a href="/docs/">Docs</a>
                <a href="/about.html">About</a>
            </body></html>"#,
        ),
    )
    .await;
    mount(
        &server,
        "/docs/",
        html(r#"<html><body><a href="/">Home</a><a href="guide">Guide</a></body></html>"#),
    )
    .await;
    mount(
        &server,
        "/docs/guide",
        html(r#"<html><body><img src="../img/logo.png"><a href="/docs/">Up</a></body></html>"#),
    )
    .await;
    mount(&server, "/about.html", html("<html><body>About</body></html>")).await;
    mount_once(&server, "/img/logo.png", bytes(b"PNG", "image/png")).await;
    mount_once(&server, "/static/site.css", bytes(b"body{color:red}", "text/css")).await;

    let dir = TempDir::new().unwrap();
    let report = crawl(&format!("{}/", base), dir.path()).await;

    assert_eq!(report.phase, CrawlPhase::Completed);
    assert_eq!(report.statistics.pages_saved, 4);
    assert_eq!(report.statistics.assets_fetched, 2);
    assert_eq!(report.statistics.remaining_in_queue, 0);

    let index = read(dir.path(), "index.html");
    assert_eq!(attrs(&index, "img", "src"), vec!["img/logo.png"]);
    assert_eq!(attrs(&index, "link", "href"), vec!["static/site.css"]);
    assert_eq!(attrs(&index, "a", "href"), vec!["docs/index.html", "about.html"]);

    let guide = read(dir.path(), "docs/guide/index.html");
    assert_eq!(attrs(&guide, "img", "src"), vec!["../../img/logo.png"]);
    assert_eq!(attrs(&guide, "a", "href"), vec!["../index.html"]);

    assert!(dir.path().join("docs/index.html").exists());
    assert!(dir.path().join("about.html").exists());
    assert_eq!(read(dir.path(), "static/site.css"), "body{color:red}");

    // Clean finish: nothing to resume, bookmarks page present
    assert!(!dir.path().join(STATE_FILE).exists());
    assert!(dir.path().join(BOOKMARKS_PAGE_FILE).exists());
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount(
        &server,
        "/",
        html(
            r#"<html><head><link rel="stylesheet" href="/css/a.css"></head>
            <body><img src="/img/a.png" srcset="/img/a.png 1x, /img/a2.png 2x"><a href="/p">P</a></body></html>"#,
        ),
    )
    .await;
    mount(&server, "/p", html(r#"<html><body><img src="/img/a.png"></body></html>"#)).await;

    // Assets must be requested exactly once across both runs
    mount_once(&server, "/img/a.png", bytes(b"PNG1", "image/png")).await;
    mount_once(&server, "/img/a2.png", bytes(b"PNG2", "image/png")).await;
    mount_once(&server, "/css/a.css", bytes(b"p{background:url(../img/a.png)}", "text/css")).await;

    let dir = TempDir::new().unwrap();
    let start = format!("{}/", base);

    let first = crawl(&start, dir.path()).await;
    let after_first = snapshot(dir.path());

    let second = crawl(&start, dir.path()).await;
    let after_second = snapshot(dir.path());

    assert_eq!(first.phase, CrawlPhase::Completed);
    assert_eq!(second.phase, CrawlPhase::Completed);
    assert_eq!(second.statistics.assets_fetched, 0);
    assert_eq!(after_first, after_second);

    // The stylesheet was rewritten in place during the first run only
    assert_eq!(read(dir.path(), "css/a.css"), "p{background:url('../img/a.png')}");
}

#[tokio::test]
async fn test_resume_from_state_file() {
    let server = MockServer::start().await;
    let base = server.uri();
    let start = format!("{}/", base);
    let queued = format!("{}/q", base);

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<html><body>home</body></html>"))
        .expect(0)
        .mount(&server)
        .await;
    mount_once(
        &server,
        "/q",
        html(r#"<html><body><a href="/">home</a><a href="/r">r</a></body></html>"#),
    )
    .await;
    mount_once(&server, "/r", html("<html><body>r</body></html>")).await;

    let dir = TempDir::new().unwrap();
    let store = CrawlStateStore::new(dir.path());
    let mut state = CrawlState::fresh(&start, false);
    state.pop_next();
    state.mark_visited(start.clone());
    state.enqueue(&queued);
    store.save(&state).unwrap();

    let report = crawl(&start, dir.path()).await;

    assert_eq!(report.phase, CrawlPhase::Completed);
    assert_eq!(report.statistics.pages_saved, 2);
    assert!(!dir.path().join("index.html").exists());
    assert!(dir.path().join("q/index.html").exists());
    assert!(dir.path().join("r/index.html").exists());

    // The link back to the visited start page is still rewritten
    let q = read(dir.path(), "q/index.html");
    assert_eq!(attrs(&q, "a", "href"), vec!["../index.html", "../r/index.html"]);
}

#[tokio::test]
async fn test_state_for_other_start_url_is_ignored() {
    let server = MockServer::start().await;
    let start = format!("{}/", server.uri());
    mount_once(&server, "/", html("<html><body>home</body></html>")).await;

    let dir = TempDir::new().unwrap();
    let mut stale = CrawlState::fresh("https://elsewhere.example/", false);
    stale.mark_visited(start.clone());
    CrawlStateStore::new(dir.path()).save(&stale).unwrap();

    let report = crawl(&start, dir.path()).await;

    assert_eq!(report.statistics.pages_saved, 1);
    assert!(dir.path().join("index.html").exists());
}

#[tokio::test]
async fn test_cross_domain_links_excluded() {
    let server = MockServer::start().await;
    let start = format!("{}/", server.uri());

    mount(
        &server,
        "/",
        html(
            r#"<html><body>
                <a href="https://other.com/x">External</a>
                <img src="/a.png">
                <img src="https://other.com/b.png">
            </body></html>"#,
        ),
    )
    .await;
    mount_once(&server, "/a.png", bytes(b"PNG", "image/png")).await;

    let dir = TempDir::new().unwrap();
    let report = crawl(&start, dir.path()).await;

    assert_eq!(report.statistics.pages_saved, 1);
    assert_eq!(report.statistics.links_discovered, 0);

    let index = read(dir.path(), "index.html");
    assert_eq!(attrs(&index, "a", "href"), vec!["https://other.com/x"]);
    assert_eq!(attrs(&index, "img", "src"), vec!["a.png", "https://other.com/b.png"]);
    assert!(dir.path().join("a.png").exists());
}

#[tokio::test]
async fn test_missing_pages_and_assets_tolerated() {
    let server = MockServer::start().await;
    let start = format!("{}/", server.uri());

    mount(
        &server,
        "/",
        html(
            r#"<html><body>
                <img src="/missing.png">
                <script src="/broken.js"></script>
                <a href="/gone">Gone</a>
                <a href="/ok">Ok</a>
            </body></html>"#,
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/missing.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken.js"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    mount(&server, "/ok", html("<html><body>ok</body></html>")).await;

    let dir = TempDir::new().unwrap();
    let report = crawl(&start, dir.path()).await;

    assert_eq!(report.phase, CrawlPhase::Completed);
    assert_eq!(report.statistics.pages_saved, 2);
    assert_eq!(report.statistics.not_found, 2);
    assert_eq!(report.statistics.failures, 1);

    // Failed references keep their original value
    let index = read(dir.path(), "index.html");
    assert_eq!(attrs(&index, "img", "src"), vec!["/missing.png"]);
    assert_eq!(attrs(&index, "script[src]", "src"), vec!["/broken.js"]);
    assert!(!dir.path().join("missing.png").exists());
    assert!(dir.path().join("ok/index.html").exists());
}

#[tokio::test]
async fn test_failed_references_rewritten_when_configured() {
    let server = MockServer::start().await;
    let start = format!("{}/", server.uri());

    mount(&server, "/", html(r#"<html><body><img src="/missing.png"></body></html>"#)).await;
    Mock::given(method("GET"))
        .and(path("/missing.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let crawler = CrawlerConfig {
        rewrite_failed_references: true,
        ..CrawlerConfig::default()
    };
    let config = Config::new(start, dir.path(), crawler).unwrap();
    Coordinator::new(config, false).unwrap().run().await.unwrap();

    let index = read(dir.path(), "index.html");
    assert_eq!(attrs(&index, "img", "src"), vec!["missing.png"]);
}

#[tokio::test]
async fn test_stylesheet_references_relative_to_stylesheet() {
    let server = MockServer::start().await;
    let start = format!("{}/blog/post/", server.uri());

    mount(
        &server,
        "/blog/post/",
        html(
            r#"<html><head><link rel="stylesheet" href="/static/css/main.css"></head>
            <body><p style="background:url(/img/p.png)">x</p></body></html>"#,
        ),
    )
    .await;
    mount_once(
        &server,
        "/static/css/main.css",
        bytes(
            br#"@import url("x.css"); .a{color:red;background:url(/img/y.png)}"#,
            "text/css",
        ),
    )
    .await;
    mount_once(&server, "/static/css/x.css", bytes(b".x{margin:0}", "text/css")).await;
    mount_once(&server, "/img/y.png", bytes(b"Y", "image/png")).await;
    mount_once(&server, "/img/p.png", bytes(b"P", "image/png")).await;

    let dir = TempDir::new().unwrap();
    crawl(&start, dir.path()).await;

    assert_eq!(
        read(dir.path(), "static/css/main.css"),
        "@import url('x.css'); .a{color:red;background:url('../../img/y.png')}"
    );
    assert_eq!(read(dir.path(), "static/css/x.css"), ".x{margin:0}");

    let page = read(dir.path(), "blog/post/index.html");
    assert_eq!(attrs(&page, "link", "href"), vec!["../../static/css/main.css"]);
    assert_eq!(attrs(&page, "p", "style"), vec!["background:url('../../img/p.png')"]);
}

#[tokio::test]
async fn test_bookmark_script_injected() {
    let server = MockServer::start().await;
    let start = format!("{}/", server.uri());
    mount(
        &server,
        "/",
        html("<html><head><title>Home</title></head><body><p>hi</p></body></html>"),
    )
    .await;

    let dir = TempDir::new().unwrap();
    crawl(&start, dir.path()).await;

    let index = read(dir.path(), "index.html");
    let document = Html::parse_document(&index);
    let selector = Selector::parse("body script").unwrap();
    let scripts: Vec<_> = document.select(&selector).map(|s| s.inner_html()).collect();
    assert_eq!(scripts.len(), 1);
    assert!(scripts[0].contains("Bookmark this Page"));

    let page = read(dir.path(), BOOKMARKS_PAGE_FILE);
    assert!(page.contains("/api/bookmarks"));
}

#[tokio::test]
async fn test_non_html_link_saved_as_asset() {
    let server = MockServer::start().await;
    let start = format!("{}/", server.uri());

    mount(
        &server,
        "/",
        html(r#"<html><body><a href="/files/report.pdf">Report</a></body></html>"#),
    )
    .await;
    mount_once(&server, "/files/report.pdf", bytes(b"%PDF-1.4", "application/pdf")).await;

    let dir = TempDir::new().unwrap();
    let report = crawl(&start, dir.path()).await;

    assert_eq!(report.statistics.pages_saved, 1);
    assert_eq!(std::fs::read(dir.path().join("files/report.pdf")).unwrap(), b"%PDF-1.4");

    let index = read(dir.path(), "index.html");
    assert_eq!(attrs(&index, "a", "href"), vec!["files/report.pdf"]);
}

#[tokio::test]
async fn test_redirect_target_marked_visited() {
    let server = MockServer::start().await;
    let base = server.uri();
    let start = format!("{}/", base);

    mount(
        &server,
        "/",
        html(r#"<html><body><a href="/old">Old</a><a href="/new">New</a></body></html>"#),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", format!("{}/new", base).as_str()))
        .mount(&server)
        .await;
    mount(&server, "/new", html("<html><body>new</body></html>")).await;

    let dir = TempDir::new().unwrap();
    let report = crawl(&start, dir.path()).await;

    // "/new" is reached through the redirect and not fetched a second time
    assert_eq!(report.statistics.pages_saved, 2);
    let requests = server.received_requests().await.unwrap();
    let new_hits = requests.iter().filter(|r| r.url.path() == "/new").count();
    assert_eq!(new_hits, 1);
}

#[tokio::test]
async fn test_ignore_query_dedups_pages() {
    let server = MockServer::start().await;
    let start = format!("{}/", server.uri());

    mount(
        &server,
        "/",
        html(r#"<html><body><a href="/list?page=1">1</a><a href="/list?page=2">2</a></body></html>"#),
    )
    .await;
    mount_once(&server, "/list", html("<html><body>list</body></html>")).await;

    let dir = TempDir::new().unwrap();
    let crawler = CrawlerConfig {
        ignore_query: true,
        ..CrawlerConfig::default()
    };
    let config = Config::new(start, dir.path(), crawler).unwrap();
    let report = Coordinator::new(config, false).unwrap().run().await.unwrap();

    assert_eq!(report.statistics.pages_saved, 2);
    assert_eq!(report.statistics.links_discovered, 1);
}

#[tokio::test]
async fn test_latin1_page_decoded_by_charset() {
    let server = MockServer::start().await;
    let start = format!("{}/", server.uri());

    let page: &[u8] =
        b"<html><head><meta charset=\"iso-8859-1\"></head><body><p>caf\xE9</p></body></html>";
    mount(&server, "/", bytes(page, "text/html; charset=iso-8859-1")).await;

    let dir = TempDir::new().unwrap();
    crawl(&start, dir.path()).await;

    let index = read(dir.path(), "index.html");
    assert!(index.contains("<p>caf\u{e9}</p>"));
    assert!(!index.contains('\u{fffd}'));
    assert_eq!(attrs(&index, "meta[charset]", "charset"), vec!["utf-8"]);
}

#[tokio::test]
async fn test_state_checkpointed_during_crawl() {
    let server = MockServer::start().await;
    let start = format!("{}/", server.uri());
    let slow = format!("{}/slow", server.uri());

    mount(&server, "/", html(r#"<html><body><a href="/slow">Slow</a></body></html>"#)).await;
    mount(
        &server,
        "/slow",
        html("<html><body>slow</body></html>").set_delay(Duration::from_millis(1500)),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let crawler = CrawlerConfig {
        checkpoint_interval: 1,
        ..CrawlerConfig::default()
    };
    let config = Config::new(start.as_str(), dir.path(), crawler).unwrap();
    let coordinator = Coordinator::new(config, false).unwrap();
    let state_path = dir.path().join(STATE_FILE);

    let (report, mid_run) = tokio::join!(coordinator.run(), async {
        tokio::time::sleep(Duration::from_millis(500)).await;
        std::fs::read_to_string(&state_path).ok()
    });

    let mid_run: serde_json::Value =
        serde_json::from_str(&mid_run.expect("state file written mid-run")).unwrap();
    assert_eq!(mid_run["start_url"], start.as_str());
    assert_eq!(mid_run["visited"], serde_json::json!([start]));
    assert_eq!(mid_run["queue"], serde_json::json!([slow]));

    assert_eq!(report.unwrap().phase, CrawlPhase::Completed);
    assert!(!state_path.exists());
}

