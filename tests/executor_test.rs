//! Job executor behavior against a scripted tab provider

use hotelier_rate_scout::adapters::AdapterSignal;
use hotelier_rate_scout::jobs::{FailureReason, Job, JobResult};
use std::time::Duration;

mod common;
use common::{FakeTabProvider, OpenBehavior, PageScript, check_in, executor, job};

const TIMEOUT: Duration = Duration::from_secs(45);
const BOOKING: &str = "https://www.booking.com/hotel/in/sea-view.html";

#[tokio::test(start_paused = true)]
async fn test_successful_job_yields_tagged_records_and_closes_tab() {
    let provider = FakeTabProvider::new();
    provider.script(BOOKING, PageScript::responding(AdapterSignal::rate(4500.0, "Deluxe", false)));
    let executor = executor(provider.clone(), TIMEOUT);

    let result = executor.execute(&job("c-17", BOOKING)).await;

    let JobResult::Success(records) = result else {
        panic!("expected success, got {result:?}");
    };
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.competitor_id.as_str(), "c-17");
    assert_eq!(record.price, 4500.0);
    assert_eq!(record.room_type, "Deluxe");
    assert!(!record.is_sold_out);
    assert_eq!(record.check_in_date, check_in());
    assert_eq!(record.currency, "INR");
    assert_eq!(record.source_url, BOOKING);

    let opened = provider.opened();
    assert_eq!(opened.len(), 1);
    assert_eq!(provider.injected()[0].1, "booking");
    assert_eq!(provider.closed(), vec![opened[0].0]);
    assert_eq!(provider.live_tabs(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_tabs_open_in_background() {
    let provider = FakeTabProvider::new();
    provider.script_all(PageScript::responding(AdapterSignal::rate(1.0, "Standard", false)));
    let executor = executor(provider.clone(), TIMEOUT);

    executor.execute(&job("c1", "https://example.org/stay")).await;

    let options = provider.opened()[0].2;
    assert!(!options.active, "scrape tabs must not steal focus");
}

#[tokio::test(start_paused = true)]
async fn test_missing_url_never_opens_a_tab() {
    let provider = FakeTabProvider::new();
    let executor = executor(provider.clone(), TIMEOUT);

    for url in ["", "   ", "https://"] {
        let result = executor.execute(&Job::rate_scrape("c1", "Nowhere", url)).await;
        assert_eq!(result, JobResult::Failure(FailureReason::MissingUrl), "url {url:?}");
    }
    assert!(provider.opened().is_empty());
    assert!(provider.closed().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_scheme_less_url_is_normalized_before_opening() {
    let provider = FakeTabProvider::new();
    provider.script_all(PageScript::responding(AdapterSignal::rate(99.0, "Twin", false)));
    let executor = executor(provider.clone(), TIMEOUT);

    let result = executor.execute(&job("c1", "www.agoda.com/grand")).await;

    assert!(result.is_success());
    assert_eq!(provider.opened_urls(), vec!["https://www.agoda.com/grand".to_string()]);
    assert_eq!(provider.injected()[0].1, "agoda");
}

#[tokio::test(start_paused = true)]
async fn test_tab_creation_failure_is_tab_failed() {
    let provider = FakeTabProvider::new();
    provider.script_all(PageScript {
        open: OpenBehavior::Fail,
        ..PageScript::default()
    });
    let executor = executor(provider.clone(), TIMEOUT);

    let result = executor.execute(&job("c1", BOOKING)).await;

    assert_eq!(result, JobResult::Failure(FailureReason::TabFailed));
    assert!(provider.closed().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_injection_failure_closes_tab() {
    let provider = FakeTabProvider::new();
    provider.script_all(PageScript {
        inject_fails: true,
        ..PageScript::default()
    });
    let executor = executor(provider.clone(), TIMEOUT);

    let result = executor.execute(&job("c1", BOOKING)).await;

    assert_eq!(result, JobResult::Failure(FailureReason::InjectionFailed));
    assert_eq!(provider.closed().len(), 1);
    assert_eq!(provider.live_tabs(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_silent_adapter_times_out_and_closes_tab() {
    let provider = FakeTabProvider::new();
    provider.script_all(PageScript::silent());
    let executor = executor(provider.clone(), TIMEOUT);

    let started = tokio::time::Instant::now();
    let result = executor.execute(&job("c1", BOOKING)).await;

    assert_eq!(result, JobResult::Failure(FailureReason::Timeout));
    assert!(started.elapsed() >= TIMEOUT);
    assert_eq!(provider.injected().len(), 1);
    assert_eq!(provider.closed().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_hanging_tab_creation_is_bounded_by_the_deadline() {
    let provider = FakeTabProvider::new();
    provider.script_all(PageScript {
        open: OpenBehavior::Hang,
        ..PageScript::default()
    });
    let executor = executor(provider.clone(), TIMEOUT);

    let result = executor.execute(&job("c1", BOOKING)).await;

    assert_eq!(result, JobResult::Failure(FailureReason::Timeout));
    assert!(provider.opened().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_late_report_after_timeout_is_ignored() {
    let provider = FakeTabProvider::new();
    provider.script_all(PageScript {
        respond: Some((TIMEOUT + Duration::from_secs(5), AdapterSignal::rate(10.0, "Suite", false))),
        ..PageScript::default()
    });
    let executor = executor(provider.clone(), TIMEOUT);

    let result = executor.execute(&job("c1", BOOKING)).await;
    assert_eq!(result, JobResult::Failure(FailureReason::Timeout));

    // let the late report fire into the void
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(provider.closed().len(), 1, "tab must be closed exactly once");
}

#[tokio::test(start_paused = true)]
async fn test_tab_crash_is_tab_failed() {
    let provider = FakeTabProvider::new();
    provider.script_all(PageScript {
        crash_after_inject: true,
        ..PageScript::default()
    });
    let executor = executor(provider.clone(), TIMEOUT);

    let result = executor.execute(&job("c1", BOOKING)).await;

    assert_eq!(result, JobResult::Failure(FailureReason::TabFailed));
    assert_eq!(provider.closed().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_adapter_error_signal_is_adapter_error() {
    let provider = FakeTabProvider::new();
    provider.script_all(PageScript::responding(AdapterSignal::failed("captcha wall")));
    let executor = executor(provider.clone(), TIMEOUT);

    let result = executor.execute(&job("c1", BOOKING)).await;

    assert_eq!(result, JobResult::Failure(FailureReason::AdapterError));
    assert_eq!(provider.closed().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_redirect_loads_inject_only_once() {
    let provider = FakeTabProvider::new();
    provider.script_all(PageScript {
        extra_loads: 3,
        respond: Some((Duration::from_millis(500), AdapterSignal::rate(2500.0, "Standard", false))),
        ..PageScript::default()
    });
    let executor = executor(provider.clone(), TIMEOUT);

    let result = executor.execute(&job("c1", BOOKING)).await;

    assert!(result.is_success());
    assert_eq!(provider.injected().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_listeners_are_released_on_every_path() {
    let provider = FakeTabProvider::new();
    let success = "https://a.example/ok";
    let timeout = "https://b.example/slow";
    let inject = "https://c.example/broken";
    provider.script(success, PageScript::responding(AdapterSignal::rate(1.0, "Standard", false)));
    provider.script(timeout, PageScript::silent());
    provider.script(
        inject,
        PageScript {
            inject_fails: true,
            ..PageScript::default()
        },
    );
    let executor = executor(provider.clone(), TIMEOUT);

    for url in [success, timeout, inject] {
        executor.execute(&job("c1", url)).await;
        assert_eq!(provider.subscriber_count(), 0, "listeners leaked after {url}");
    }
    assert_eq!(provider.live_tabs(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_price_is_sold_out_with_defaults() {
    let provider = FakeTabProvider::new();
    let signal = AdapterSignal::from_payload(r#"{"success":true,"data":{"price":null,"room_type":"  "}}"#)
        .expect("valid payload");
    provider.script_all(PageScript::responding(signal));
    let executor = executor(provider.clone(), TIMEOUT).with_default_currency("EUR");

    let result = executor.execute(&job("c1", BOOKING)).await;

    let JobResult::Success(records) = result else {
        panic!("expected success, got {result:?}");
    };
    assert!(records[0].is_sold_out);
    assert_eq!(records[0].price, 0.0);
    assert_eq!(records[0].room_type, "Standard");
    assert_eq!(records[0].currency, "EUR");
}

#[tokio::test(start_paused = true)]
async fn test_check_in_falls_back_to_url_query() {
    let provider = FakeTabProvider::new();
    provider.script_all(PageScript::responding(AdapterSignal::rate(3100.0, "Deluxe", false)));
    let executor = executor(provider.clone(), TIMEOUT);

    let url = "https://www.booking.com/hotel/x.html?checkin=2026-12-24&checkout=2026-12-25";
    let result = executor.execute(&Job::rate_scrape("c9", "X", url)).await;

    let JobResult::Success(records) = result else {
        panic!("expected success, got {result:?}");
    };
    assert_eq!(records[0].check_in_date.to_string(), "2026-12-24");
}

#[tokio::test(start_paused = true)]
async fn test_month_first_url_date_keeps_the_records() {
    let provider = FakeTabProvider::new();
    provider.script_all(PageScript::responding(AdapterSignal::rate(5200.0, "Premium", false)));
    let executor = executor(provider.clone(), TIMEOUT);

    let url = "https://www.makemytrip.com/hotels/hilltop-details.html?checkin=11022026&checkout=11032026";
    let result = executor.execute(&Job::rate_scrape("c-9", "Hilltop", url)).await;

    let JobResult::Success(records) = result else {
        panic!("expected success, got {result:?}");
    };
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].check_in_date, check_in());
}
