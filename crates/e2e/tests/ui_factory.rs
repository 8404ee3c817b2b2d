//! Page factory driven end to end through the recording driver

use std::sync::Arc;
use std::time::Duration;
use testbed_common::{Error, Poll};
use testbed_e2e::{Scenario, Stopwatch, TestResults};
use testbed_web::{Environment, Locator, Page, PageFactory, RecordingDriver, WebDriver};

fn shop() -> (PageFactory, Arc<Environment>, Arc<Environment>, Arc<RecordingDriver>) {
    testbed_common::logging::init("warn");
    let staging = Arc::new(Environment::new("staging", "https://staging.shop.test/"));
    let production = Arc::new(Environment::new("production", "https://shop.test"));
    let chrome = Arc::new(RecordingDriver::new("chrome"));

    let mut factory = PageFactory::new("shop");
    factory
        .store_environment("staging", staging.clone())
        .unwrap()
        .store_environment("production", production.clone())
        .unwrap()
        .store_engine("chrome", chrome.clone())
        .unwrap()
        .switch_environment(&staging)
        .unwrap()
        .switch_engine(&(chrome.clone() as Arc<dyn WebDriver>))
        .unwrap();
    (factory, staging, production, chrome)
}

#[test]
fn test_pages_follow_environment_switch() {
    let (mut factory, _, production, chrome) = shop();
    let login = factory
        .add_page("login", |d| Page::new(d).with_path("/login"))
        .unwrap();
    let cart = factory
        .add_page("cart", |d| Page::new(d).with_path("cart"))
        .unwrap();

    login.read().open().unwrap();
    factory.switch_environment(&production).unwrap();
    login.read().open().unwrap();
    cart.read().open().unwrap();

    assert_eq!(
        chrome.visited(),
        vec![
            "https://staging.shop.test/login",
            "https://shop.test/login",
            "https://shop.test/cart",
        ]
    );
    assert_eq!(factory.environments().len(), 1);
    assert_eq!(factory.environments()[0].kind(), "staging");
}

#[test]
fn test_unstored_environment_is_rejected() {
    let (mut factory, staging, _, _) = shop();
    let page = factory.add_page("home", Page::new).unwrap();

    let rogue = Arc::new(Environment::new("staging", "https://staging.shop.test"));
    let err = factory.switch_environment(&rogue).unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
    assert!(Arc::ptr_eq(factory.environment().unwrap(), &staging));
    assert_eq!(page.read().domain(), Some("https://staging.shop.test"));
}

#[test]
fn test_data_driven_navigation() {
    let (mut factory, _, _, chrome) = shop();
    let home = factory.add_page("home", Page::new).unwrap();

    let scenarios = vec![
        Scenario::new("search", ("search?q=shoes", "https://staging.shop.test/search?q=shoes")).unwrap(),
        Scenario::new("root", ("", "https://staging.shop.test/")).unwrap(),
    ];
    let (rows, ids) = Scenario::parse(&scenarios);

    let mut results = TestResults::new();
    for (row, id) in rows.iter().zip(&ids) {
        let uri = row[0].as_str().unwrap();
        home.read().go(uri).unwrap();
        results
            .add(id, chrome.current_url().unwrap(), &row[1])
            .unwrap();
    }
    assert_eq!(results.failed(), 0, "{:?}", results.failures().collect::<Vec<_>>());
}

#[test]
fn test_wait_for_element_appearing_later() {
    let (mut factory, _, _, chrome) = shop();
    let page = factory
        .add_page("results", |d| Page::new(d).with_timeout(Duration::from_secs(2)))
        .unwrap();

    let banner = Locator::Css(".banner".into());
    let mut watch = Stopwatch::new();
    let writer = {
        let chrome = chrome.clone();
        let banner = banner.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(300));
            chrome.insert(banner);
        })
    };

    page.read().wait_for(&banner).unwrap();
    watch.lap(Some("banner")).unwrap();
    writer.join().unwrap();

    assert!(watch.elapsed(None, None).unwrap() >= Duration::from_millis(300));
}

#[tokio::test]
async fn test_async_poll_against_driver() {
    let chrome = Arc::new(RecordingDriver::new("firefox"));
    let spinner = Locator::Id("spinner".into());
    chrome.insert(spinner.clone());

    let remover = {
        let chrome = chrome.clone();
        let spinner = spinner.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            chrome.remove(&spinner);
        })
    };

    let poll = Poll::new(Duration::from_secs(2), Duration::from_millis(50));
    let outcome = poll
        .try_wait_until_true_async(|| {
            let chrome = chrome.clone();
            let spinner = spinner.clone();
            async move { chrome.is_present(&spinner).map(|present| !present) }
        })
        .await
        .unwrap();

    remover.await.unwrap();
    assert!(outcome.is_satisfied());
    assert!(outcome.attempts() > 1);
}
