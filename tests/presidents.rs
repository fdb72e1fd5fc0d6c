use chrono::NaiveDate;
use ulid::Ulid;

use incumbent::time::from_date;
use incumbent::{Registry, ScopeStore, StoreError, Tenure, Us, ValidationFailure};

// ── Test infrastructure ──────────────────────────────────────

const D: Us = 86_400_000_000;
const START: &str = "entered_office_at";
const FINISH: &str = "left_office_at";

fn day(n: f64) -> Us {
    (n * D as f64) as Us
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// A country has many presidents, only one in office at a time, and many
/// senators who may serve side by side.
fn setup() -> (ScopeStore<Tenure>, ScopeStore<Tenure>) {
    init_tracing();
    let registry = Registry::new();
    let presidents = registry
        .register_json(
            "President",
            r#"{
                "start_field": "entered_office_at",
                "finish_field": "left_office_at",
                "parent_accessor": "country",
                "unique": true,
                "backend": "PostgreSQL"
            }"#,
        )
        .unwrap();
    let senators = registry
        .register_json(
            "Senator",
            r#"{
                "start_field": "entered_office_at",
                "finish_field": "left_office_at",
                "parent_accessor": "country"
            }"#,
        )
        .unwrap();
    (ScopeStore::new(presidents), ScopeStore::new(senators))
}

fn official(country: Ulid, start: Us, finish: Option<Us>) -> Tenure {
    let t = Tenure::new(Ulid::new())
        .set(START, start)
        .belonging_to("country", country);
    match finish {
        Some(f) => t.set(FINISH, f),
        None => t,
    }
}

async fn elect(store: &ScopeStore<Tenure>, country: Ulid, start: f64, finish: Option<f64>) -> Tenure {
    let t = official(country, day(start), finish.map(day));
    store.save(t.clone()).await.unwrap();
    t
}

// ── Uniquely active ──────────────────────────────────────────

#[tokio::test]
async fn uniquely_active_presidents() {
    let (presidents, _) = setup();
    let country = Ulid::new();
    let washington = elect(&presidents, country, 1.0, Some(8.0)).await;
    let roosevelt = elect(&presidents, country, 10.0, Some(15.0)).await;
    let nixon = elect(&presidents, country, 15.0, Some(18.0)).await;
    let _reagan = elect(&presidents, country, 18.0, Some(40.0)).await;
    let obama = elect(&presidents, country, 40.0, None).await;

    assert_eq!(presidents.active_one(&country, day(6.0)).await, Some(washington));
    assert_eq!(presidents.active_one(&country, day(12.0)).await, Some(roosevelt));
    assert_eq!(presidents.active_at(&country, day(12.0)).await.len(), 1);
    // boundary belongs to the successor
    assert_eq!(presidents.active_one(&country, day(15.0)).await, Some(nixon));
    assert_eq!(presidents.active_one(&country, day(9.0)).await, None);
    assert_eq!(presidents.active_one(&country, day(0.5)).await, None);
    assert_eq!(presidents.active_one(&country, day(45.0)).await, Some(obama.clone()));
    assert_eq!(presidents.active_now(&country).await, vec![obama]);
}

#[tokio::test]
async fn overlapping_president_rejected() {
    let (presidents, _) = setup();
    let country = Ulid::new();
    let pres1 = elect(&presidents, country, 1.0, Some(10.0)).await;

    let pres2 = official(country, day(5.0), Some(day(12.0)));
    let err = presidents.save(pres2).await.unwrap_err();
    assert_eq!(
        err,
        StoreError::Rejected(ValidationFailure::Conflict(vec![pres1.id.unwrap()]))
    );
    assert!(err.to_string().starts_with("rejected: active period conflicts"));
}

#[tokio::test]
async fn backwards_term_rejected() {
    let (presidents, _) = setup();
    let err = presidents
        .save(official(Ulid::new(), day(10.0), Some(day(5.0))))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "rejected: Left office at must be after Entered office at"
    );
}

#[tokio::test]
async fn term_extension_of_sitting_president() {
    let (presidents, _) = setup();
    let country = Ulid::new();
    elect(&presidents, country, 1.0, Some(10.0)).await;
    let pres3 = elect(&presidents, country, 10.0, Some(12.0)).await;
    elect(&presidents, country, 15.0, Some(22.0)).await;

    assert!(presidents.save(pres3.clone().set(FINISH, day(14.0))).await.is_ok());
    assert!(presidents.save(pres3.set(FINISH, day(16.0))).await.is_err());
}

#[tokio::test]
async fn presidents_in_office_during_a_period() {
    let (presidents, _) = setup();
    let country = Ulid::new();
    let bounded = elect(&presidents, country, 1.0, Some(4.0)).await;
    let unbounded = elect(&presidents, country, 4.0, None).await;

    assert_eq!(
        presidents.active_in(&country, Some(day(3.0)), Some(day(7.0))).await,
        vec![bounded.clone(), unbounded.clone()]
    );
    assert_eq!(
        presidents.active_in(&country, None, Some(day(4.0))).await,
        vec![bounded]
    );
    assert_eq!(
        presidents.active_in(&country, Some(day(4.0)), None).await,
        vec![unbounded]
    );
}

#[tokio::test]
async fn date_only_terms() {
    let (presidents, _) = setup();
    let country = Ulid::new();
    let ymd = |y, m, d| from_date(NaiveDate::from_ymd_opt(y, m, d).unwrap());
    let washington = official(country, ymd(1789, 4, 30), Some(ymd(1797, 5, 4)));
    presidents.save(washington.clone()).await.unwrap();
    assert_eq!(
        presidents.active_one(&country, ymd(1790, 1, 1)).await,
        Some(washington)
    );
}

// ── Many active ──────────────────────────────────────────────

#[tokio::test]
async fn many_active_senators() {
    let (_, senators) = setup();
    let country = Ulid::new();
    let byrd = elect(&senators, country, 1959.0, Some(2010.0)).await;
    let inouye = elect(&senators, country, 1963.0, Some(2012.0)).await;
    let thurmond = elect(&senators, country, 1954.0, Some(2003.0)).await;
    let kennedy = elect(&senators, country, 1962.0, Some(2009.0)).await;
    let cochran = elect(&senators, country, 1978.0, None).await;

    assert_eq!(
        senators.active_at(&country, day(2008.0)).await,
        vec![byrd.clone(), inouye, kennedy, cochran]
    );
    assert_eq!(
        senators.active_at(&country, day(1960.0)).await,
        vec![byrd, thurmond.clone()]
    );
    assert!(senators.active_at(&country, day(1954.0)).await.contains(&thurmond));
    assert!(!senators.active_at(&country, day(2003.0)).await.contains(&thurmond));
    assert!(senators.active_at(&country, day(1600.0)).await.is_empty());
}
