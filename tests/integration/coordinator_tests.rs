//! Batch coordination: retries, escalation, merging and the contact crawl

use crate::fake::{FakeBrowser, FakeEngine, Nav};
use sitescout::browser::BrowserError;
use sitescout::config::Config;
use sitescout::crawler::{CAPTCHA_WARNING, INTERNAL_SERVER_ERROR, INVALID_PAGE, PROXY_ISSUE};
use sitescout::extract::CompanyInfo;
use sitescout::{Coordinator, ResultMap, UrlRecord};
use std::sync::Arc;
use std::time::{Duration, Instant};

const COMPLETE: &str = r#"<html>
<head><title>Good Company | Home</title></head>
<body>
  <div class="contact">
    <p class="address">Suite 400, 12 Harbour Road, Building 7, Wellington</p>
    <a href="mailto:hello@good.test">hello@good.test</a>
    <a href="tel:+64 4 555 0123">+64 4 555 0123</a>
  </div>
</body>
</html>"#;

const NO_PHONE: &str = r#"<html>
<head><title>Acme | Home</title></head>
<body>
  <p class="address">Suite 400, 12 Harbour Road, Building 7, Wellington</p>
  <a href="mailto:hello@acme.test">hello@acme.test</a>
  <a href="/contact">Contact Us</a>
  <a href="/pricing">Pricing</a>
</body>
</html>"#;

const CONTACT_PAGE: &str = r#"<html>
<head><title>Contact | Acme</title></head>
<body><p>Call us on <a href="tel:+1 415 555 0100">+1 415 555 0100</a></p></body>
</html>"#;

const PROXIES: &[&str] = &["http://p1.test:8000", "http://p2.test:8000"];

/// Creates a test configuration with no waits between retries
fn test_config(proxies: &[&str]) -> Config {
    let mut config = Config::default();
    config.retry.server_error_backoff_ms = 0;
    config.retry.escalation_pause_ms = 0;
    config.contact.pool_size = 2;
    config.proxy.servers = proxies.iter().map(|p| p.to_string()).collect();
    if !proxies.is_empty() {
        config.proxy.username = Some("scout".to_string());
        config.proxy.password = Some("secret".to_string());
    }
    config
}

fn coordinator(engine: &FakeEngine, config: Config) -> Coordinator<FakeEngine> {
    Coordinator::new(engine.clone(), Arc::new(config))
}

fn urls(list: &[&str]) -> Vec<String> {
    list.iter().map(|u| u.to_string()).collect()
}

#[tokio::test]
async fn test_good_and_blocked_without_proxies() {
    let engine = FakeEngine::new();
    engine
        .script("https://good.test", vec![Nav::ok(COMPLETE)])
        .script("https://blocked.test", vec![Nav::status(403)]);

    let results = coordinator(&engine, test_config(&[]))
        .process_batch(&urls(&["https://good.test", "https://blocked.test"]))
        .await;

    let good = results.get("https://good.test").unwrap();
    assert!(good.info.is_some());
    assert_eq!(good.attempt, 1);
    assert!(good.err.is_none());

    let blocked = results.get("https://blocked.test").unwrap();
    assert!(blocked.info.is_none());
    assert_eq!(blocked.err.as_deref(), Some(PROXY_ISSUE));
    assert_eq!(blocked.err_code, Some(404));

    // No proxy to rotate to: a single pass, its browser closed
    assert_eq!(engine.launches(), vec![None]);
    assert_eq!(engine.browsers_closed(), 1);
    assert_eq!(engine.pages_open(), 0);
}

#[tokio::test]
async fn test_blocked_url_recovers_through_next_proxy() {
    let engine = FakeEngine::new();
    engine
        .script("https://good.test", vec![Nav::ok(COMPLETE)])
        .script(
            "https://blocked.test",
            vec![Nav::status(429), Nav::ok(COMPLETE)],
        );

    let results = coordinator(&engine, test_config(PROXIES))
        .process_batch(&urls(&["https://good.test", "https://blocked.test"]))
        .await;

    let blocked = results.get("https://blocked.test").unwrap();
    assert!(blocked.info.is_some());
    assert!(blocked.err.is_none());
    assert_eq!(blocked.attempt, 2);

    // The resolved URL is not visited again
    assert_eq!(engine.navigations("https://good.test"), 1);
    assert_eq!(results.get("https://good.test").unwrap().attempt, 1);

    assert_eq!(
        engine.launches(),
        vec![None, Some("http://p1.test:8000".to_string())]
    );
    assert_eq!(engine.browsers_closed(), 2);

    // Proxy credentials are only handed to pages behind a proxy
    let policies = engine.policies();
    assert!(policies.first().unwrap().credentials.is_none());
    let last = policies.last().unwrap();
    assert_eq!(last.credentials.as_ref().unwrap().username, "scout");
    assert!(last.blocks("image"));
}

#[tokio::test]
async fn test_proxy_exhaustion_stops_escalating() {
    let engine = FakeEngine::new();
    engine.script("https://blocked.test", vec![Nav::status(403)]);

    let results = coordinator(&engine, test_config(&PROXIES[..1]))
        .process_batch(&urls(&["https://blocked.test"]))
        .await;

    let blocked = results.get("https://blocked.test").unwrap();
    assert!(blocked.info.is_none());
    assert_eq!(blocked.err.as_deref(), Some(PROXY_ISSUE));
    assert_eq!(blocked.err_code, Some(404));
    assert_eq!(blocked.attempt, 2);

    assert_eq!(
        engine.launches(),
        vec![None, Some("http://p1.test:8000".to_string())]
    );
    assert_eq!(engine.browsers_closed(), 2);
}

#[tokio::test]
async fn test_browser_crash_relaunches_on_same_proxy() {
    let engine = FakeEngine::new();
    // Three crashes use up the in-place navigation retries of the first pass
    engine.script(
        "https://flaky.test",
        vec![Nav::crash(), Nav::crash(), Nav::crash(), Nav::ok(COMPLETE)],
    );

    let results = coordinator(&engine, test_config(&[]))
        .process_batch(&urls(&["https://flaky.test"]))
        .await;

    let flaky = results.get("https://flaky.test").unwrap();
    assert!(flaky.info.is_some());
    assert!(flaky.err.is_none());
    assert_eq!(flaky.attempt, 2);

    assert_eq!(engine.launches(), vec![None, None]);
    assert_eq!(engine.navigations("https://flaky.test"), 4);
}

#[tokio::test]
async fn test_retry_ceiling_marks_unresolved_records() {
    let engine = FakeEngine::new();
    engine.script("https://dead.test", vec![Nav::crash()]);

    let results = coordinator(&engine, test_config(&[]))
        .process_batch(&urls(&["https://dead.test"]))
        .await;

    let dead = results.get("https://dead.test").unwrap();
    assert!(dead.info.is_none());
    assert_eq!(dead.err.as_deref(), Some(INTERNAL_SERVER_ERROR));
    assert_eq!(dead.err_code, Some(500));
    assert_eq!(dead.attempt, 3);

    // One initial pass plus two escalations
    assert_eq!(engine.launches().len(), 3);
    assert_eq!(engine.browsers_closed(), 3);
}

#[tokio::test]
async fn test_previous_results_are_not_redone() {
    let engine = FakeEngine::new();
    engine
        .script("https://done.test", vec![Nav::ok(COMPLETE)])
        .script("https://spent.test", vec![Nav::ok(COMPLETE)])
        .script("https://new.test", vec![Nav::ok(COMPLETE)]);

    let done = UrlRecord {
        info: Some(CompanyInfo {
            emails: vec!["kept@done.test".to_string()],
            ..CompanyInfo::default()
        }),
        attempt: 1,
        ..UrlRecord::default()
    };
    let spent = UrlRecord {
        attempt: 3,
        err: Some(INTERNAL_SERVER_ERROR.to_string()),
        err_code: Some(500),
        ..UrlRecord::default()
    };

    let mut previous = ResultMap::new();
    previous.insert("https://done.test", done.clone());
    previous.insert("https://spent.test", spent.clone());

    let results = coordinator(&engine, test_config(&[]))
        .process_batch_with(
            &urls(&["https://done.test", "https://spent.test", "https://new.test"]),
            previous,
            None,
        )
        .await;

    assert_eq!(results.get("https://done.test"), Some(&done));
    assert_eq!(results.get("https://spent.test"), Some(&spent));
    assert!(results.get("https://new.test").unwrap().info.is_some());

    assert_eq!(engine.navigations("https://done.test"), 0);
    assert_eq!(engine.navigations("https://spent.test"), 0);
    assert_eq!(engine.navigations("https://new.test"), 1);
}

#[tokio::test]
async fn test_contact_page_gets_its_own_record() {
    let engine = FakeEngine::new();
    engine
        .script("https://acme.test", vec![Nav::ok(NO_PHONE)])
        .script("https://acme.test/contact", vec![Nav::ok(CONTACT_PAGE)]);

    let results = coordinator(&engine, test_config(&[]))
        .process_batch(&urls(&["https://acme.test"]))
        .await;

    let parent = results.get("https://acme.test").unwrap();
    assert_eq!(parent.other_urls, vec!["https://acme.test/contact"]);
    let parent_info = parent.info.as_ref().unwrap();
    assert!(parent_info.phone_numbers.is_empty());

    let contact = results.get("https://acme.test/contact").unwrap();
    assert_eq!(contact.attempt, 2);
    assert!(contact.err.is_none());
    assert!(contact
        .info
        .as_ref()
        .unwrap()
        .phone_numbers
        .contains(&"+14155550100".to_string()));

    assert_eq!(engine.pages_opened(), 2);
    assert_eq!(engine.pages_open(), 0);
}

#[tokio::test]
async fn test_contact_crawl_can_be_disabled() {
    let engine = FakeEngine::new();
    engine.script("https://acme.test", vec![Nav::ok(NO_PHONE)]);

    let mut config = test_config(&[]);
    config.contact.enabled = false;

    let results = coordinator(&engine, config)
        .process_batch(&urls(&["https://acme.test"]))
        .await;

    assert_eq!(results.len(), 1);
    assert!(results.get("https://acme.test").unwrap().other_urls.is_empty());
    assert_eq!(engine.navigations("https://acme.test/contact"), 0);
}

#[tokio::test]
async fn test_contact_fan_out_is_bounded() {
    let links = ["/contact", "/contact-us", "/get-in-touch", "/support/contact", "/talk"];
    let anchors: String = links
        .iter()
        .map(|l| format!(r#"<a href="{}">Talk to us</a>"#, l))
        .collect();
    let parent = format!("<html><body><p>Acme</p>{}</body></html>", anchors);

    let engine = FakeEngine::new();
    engine.script("https://acme.test", vec![Nav::ok(&parent)]);
    for link in links {
        engine.script(
            &format!("https://acme.test{}", link),
            vec![Nav::ok(CONTACT_PAGE)],
        );
    }

    let results = coordinator(&engine, test_config(&[]))
        .process_batch(&urls(&["https://acme.test"]))
        .await;

    assert_eq!(results.len(), 1 + links.len());
    for link in links {
        let record = results.get(&format!("https://acme.test{}", link)).unwrap();
        assert!(record.info.is_some(), "{}", link);
    }

    // The parent page plus at most `pool-size` contact pages at once
    assert!(engine.max_pages_open() <= 3, "{}", engine.max_pages_open());
    assert!(engine.max_pages_open() >= 2);
    assert_eq!(engine.pages_open(), 0);
}

#[tokio::test]
async fn test_status_codes_are_classified() {
    let engine = FakeEngine::new();
    engine
        .script("https://missing.test", vec![Nav::status(404)])
        .script("https://broken.test", vec![Nav::status(503)]);

    let results = coordinator(&engine, test_config(&[]))
        .process_batch(&urls(&["https://missing.test", "https://broken.test"]))
        .await;

    let missing = results.get("https://missing.test").unwrap();
    assert_eq!(missing.err.as_deref(), Some(INVALID_PAGE));
    assert_eq!(missing.err_code, Some(404));
    assert_eq!(engine.navigations("https://missing.test"), 1);

    // 5xx is retried in place twice, then recorded without escalation
    let broken = results.get("https://broken.test").unwrap();
    assert_eq!(broken.err.as_deref(), Some(INTERNAL_SERVER_ERROR));
    assert_eq!(broken.err_code, Some(500));
    assert_eq!(engine.navigations("https://broken.test"), 3);
    assert_eq!(engine.launches().len(), 1);
}

#[tokio::test]
async fn test_captcha_page_is_extracted_with_warning() {
    let html = COMPLETE.replace(
        "<body>",
        r#"<body><div id="g-recaptcha-widget"></div>"#,
    );
    let engine = FakeEngine::new();
    engine.script("https://guarded.test", vec![Nav::ok(&html)]);

    let results = coordinator(&engine, test_config(&[]))
        .process_batch(&urls(&["https://guarded.test"]))
        .await;

    let guarded = results.get("https://guarded.test").unwrap();
    assert!(guarded.info.is_some());
    assert_eq!(guarded.err.as_deref(), Some(CAPTCHA_WARNING));
    assert_eq!(guarded.err_code, Some(422));
    assert_eq!(engine.launches().len(), 1);
}

#[tokio::test]
async fn test_launch_failure_is_recorded() {
    let engine = FakeEngine::new();
    engine.fail_launch(BrowserError::Launch(
        "Failed to launch the browser process".to_string(),
    ));

    let results = coordinator(&engine, test_config(&[]))
        .process_batch(&urls(&["https://good.test"]))
        .await;

    let good = results.get("https://good.test").unwrap();
    assert!(good.info.is_none());
    assert_eq!(good.err_code, Some(500));
    assert_eq!(good.attempt, 0);
    assert_eq!(engine.launches().len(), 1);
    assert_eq!(engine.browsers_closed(), 0);
}

#[tokio::test]
async fn test_supplied_browser_is_borrowed() {
    let engine = FakeEngine::new();
    engine.script("https://good.test", vec![Nav::ok(COMPLETE)]);
    let browser = FakeBrowser::standalone(&engine);

    let results = coordinator(&engine, test_config(&[]))
        .process_batch_with(&urls(&["https://good.test"]), ResultMap::new(), Some(&browser))
        .await;

    assert!(results.get("https://good.test").unwrap().info.is_some());
    assert!(engine.launches().is_empty());
    assert_eq!(engine.browsers_closed(), 0);
}

#[tokio::test]
async fn test_page_creation_is_retried() {
    let engine = FakeEngine::new();
    engine
        .script("https://good.test", vec![Nav::ok(COMPLETE)])
        .fail_pages(3);

    let results = coordinator(&engine, test_config(&[]))
        .process_batch(&urls(&["https://good.test"]))
        .await;

    assert!(results.get("https://good.test").unwrap().info.is_some());
    assert_eq!(engine.pages_opened(), 1);
}

#[tokio::test]
async fn test_page_creation_failure_is_classified() {
    let engine = FakeEngine::new();
    engine
        .script("https://good.test", vec![Nav::ok(COMPLETE)])
        .fail_pages(100);

    let results = coordinator(&engine, test_config(&[]))
        .process_batch(&urls(&["https://good.test"]))
        .await;

    let good = results.get("https://good.test").unwrap();
    assert!(good.info.is_none());
    assert_eq!(good.err_code, Some(500));
    assert_eq!(engine.navigations("https://good.test"), 0);
}

#[tokio::test]
async fn test_duplicate_targets_are_processed_once() {
    let engine = FakeEngine::new();
    engine.script("https://good.test", vec![Nav::ok(COMPLETE)]);

    let results = coordinator(&engine, test_config(&[]))
        .process_batch(&urls(&["https://good.test", "https://good.test"]))
        .await;

    assert_eq!(results.len(), 1);
    assert_eq!(engine.navigations("https://good.test"), 1);
}

#[tokio::test]
async fn test_blocked_contact_page_switches_proxy() {
    let engine = FakeEngine::new();
    engine
        .script("https://acme.test", vec![Nav::ok(NO_PHONE)])
        .script(
            "https://acme.test/contact",
            vec![Nav::status(403), Nav::ok(CONTACT_PAGE)],
        );

    let results = coordinator(&engine, test_config(PROXIES))
        .process_batch(&urls(&["https://acme.test"]))
        .await;

    assert_eq!(
        engine.launches(),
        vec![None, Some("http://p1.test:8000".to_string())]
    );

    // The parent resolved in the first pass; only its contact page is retried
    assert_eq!(engine.navigations("https://acme.test"), 1);
    assert_eq!(engine.navigations("https://acme.test/contact"), 2);

    let contact = results.get("https://acme.test/contact").unwrap();
    assert!(contact.info.is_some());
    assert!(contact.err.is_none());
    assert_eq!(contact.attempt, 3);
    assert_eq!(
        results.get("https://acme.test").unwrap().other_urls,
        vec!["https://acme.test/contact"]
    );
}

#[tokio::test]
async fn test_crashed_contact_page_relaunches_browser() {
    let engine = FakeEngine::new();
    engine
        .script("https://acme.test", vec![Nav::ok(NO_PHONE)])
        .script(
            "https://acme.test/contact",
            vec![Nav::crash(), Nav::crash(), Nav::crash(), Nav::ok(CONTACT_PAGE)],
        );

    let results = coordinator(&engine, test_config(&[]))
        .process_batch(&urls(&["https://acme.test"]))
        .await;

    assert_eq!(engine.launches(), vec![None, None]);
    assert_eq!(engine.navigations("https://acme.test"), 1);
    assert_eq!(engine.navigations("https://acme.test/contact"), 4);

    let contact = results.get("https://acme.test/contact").unwrap();
    assert!(contact.info.is_some());
    assert_eq!(contact.attempt, 3);
}

#[tokio::test]
async fn test_spent_contact_page_is_not_retried() {
    let engine = FakeEngine::new();
    engine
        .script("https://acme.test", vec![Nav::ok(NO_PHONE)])
        .script("https://acme.test/contact", vec![Nav::status(403)]);

    let mut config = test_config(PROXIES);
    config.retry.max_url_attempts = 2;

    let results = coordinator(&engine, config)
        .process_batch(&urls(&["https://acme.test"]))
        .await;

    // A contact page starts at attempt 1, so one visit spends it
    assert_eq!(engine.launches(), vec![None]);
    assert_eq!(engine.navigations("https://acme.test/contact"), 1);
    let contact = results.get("https://acme.test/contact").unwrap();
    assert_eq!(contact.err.as_deref(), Some(PROXY_ISSUE));
    assert_eq!(contact.attempt, 2);
}

#[tokio::test]
async fn test_proxy_change_wins_over_relaunch() {
    let engine = FakeEngine::new();
    engine
        .script(
            "https://flaky.test",
            vec![Nav::crash(), Nav::crash(), Nav::crash(), Nav::ok(COMPLETE)],
        )
        .script(
            "https://blocked.test",
            vec![Nav::status(403), Nav::ok(COMPLETE)],
        );

    let results = coordinator(&engine, test_config(PROXIES))
        .process_batch(&urls(&["https://flaky.test", "https://blocked.test"]))
        .await;

    // One pass raised both flags: the second browser goes through a proxy
    assert_eq!(
        engine.launches(),
        vec![None, Some("http://p1.test:8000".to_string())]
    );
    assert!(results.get("https://flaky.test").unwrap().info.is_some());
    assert!(results.get("https://blocked.test").unwrap().info.is_some());
}

#[tokio::test]
async fn test_contact_page_without_a_browser_page_is_recorded() {
    let engine = FakeEngine::new();
    engine
        .script("https://acme.test", vec![Nav::ok(NO_PHONE)])
        .script("https://acme.test/contact", vec![Nav::ok(CONTACT_PAGE)])
        .fail_pages_after(1, 100);

    let results = coordinator(&engine, test_config(&[]))
        .process_batch(&urls(&["https://acme.test"]))
        .await;

    let parent = results.get("https://acme.test").unwrap();
    assert!(parent.info.is_some());
    assert!(parent.err.is_none());

    let contact = results.get("https://acme.test/contact").unwrap();
    assert!(contact.info.is_none());
    assert_eq!(contact.err.as_deref(), Some(INTERNAL_SERVER_ERROR));
    assert_eq!(contact.err_code, Some(500));
    assert_eq!(contact.attempt, 1);

    assert_eq!(engine.navigations("https://acme.test/contact"), 0);
    assert_eq!(engine.launches().len(), 1);
    assert_eq!(engine.pages_opened(), 1);
    assert_eq!(engine.pages_open(), 0);
}

#[tokio::test]
async fn test_no_pause_when_escalation_leaves_nothing_to_do() {
    let engine = FakeEngine::new();
    engine.script("https://blocked.test", vec![Nav::status(403)]);

    let mut config = test_config(PROXIES);
    config.retry.max_url_attempts = 1;
    config.retry.escalation_pause_ms = 5_000;

    let started = Instant::now();
    let results = coordinator(&engine, config)
        .process_batch(&urls(&["https://blocked.test"]))
        .await;

    assert!(started.elapsed() < Duration::from_secs(2), "{:?}", started.elapsed());
    assert_eq!(engine.launches(), vec![None]);
    assert_eq!(results.get("https://blocked.test").unwrap().attempt, 1);
}
