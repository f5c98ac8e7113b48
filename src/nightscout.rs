//! Nightscout data poller
//!
//! Asks the server for the two newest sensor glucose values and turns them
//! into one [`Reading`]. Fetching through [`ReadingSource`] never gives up:
//! every failure is logged and retried after the configured delay.

use core::fmt;

use embedded_hal::delay::DelayNs;
use serde::Deserialize;
use serde_json::Value;

use crate::arrow::Direction;
use crate::http::HttpClient;
use crate::retry::RetryPolicy;

/// Path of the entries endpoint, asking for the two newest samples
pub const ENTRIES_PATH: &str = "/api/v1/entries/sgv.json?count=2";

/// Latest glucose value with its trend and the change since the sample before
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reading {
    pub value: i32,
    pub direction: Direction,
    pub delta: i32,
}

impl Reading {
    /// Delta with an explicit `+` for rises, `"0"` when unchanged
    pub fn delta_text(&self) -> String {
        if self.delta > 0 {
            format!("+{}", self.delta)
        } else {
            self.delta.to_string()
        }
    }
}

/// Newest element of the `sgv.json` array, extra fields are ignored.
/// Uploaders without a trend leave `direction` out or send `null`.
#[derive(Debug, Deserialize)]
struct Latest {
    sgv: i32,
    #[serde(default)]
    direction: Option<String>,
}

/// Older element, only its value is used
#[derive(Debug, Deserialize)]
struct Previous {
    sgv: i32,
}

/// Trend token used when the newest sample carries none
const MISSING_TREND: &str = "None";

/// Why a single poll failed
#[derive(Debug)]
pub enum PollError {
    /// The request did not complete or did not answer 200
    Transport(anyhow::Error),
    /// The server answered, but not with two usable samples
    Malformed(String),
}

impl fmt::Display for PollError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollError::Transport(e) => write!(f, "transport error: {:#}", e),
            PollError::Malformed(reason) => write!(f, "malformed response: {}", reason),
        }
    }
}

impl std::error::Error for PollError {}

/// Entries URL for `base`: its scheme and authority followed by
/// [`ENTRIES_PATH`]. Any path or query on `base` is dropped. A base without
/// scheme is taken as `https`.
pub fn entries_url(base: &str) -> String {
    let base = base.trim();
    let (scheme, rest) = match base.split_once("://") {
        Some((scheme, rest)) => (scheme, rest),
        None => ("https", base),
    };
    let authority = rest
        .split(|c| c == '/' || c == '?' || c == '#')
        .next()
        .unwrap_or_default();
    format!("{}://{}{}", scheme, authority, ENTRIES_PATH)
}

/// Parse an `sgv.json` body, newest sample first
pub fn parse_entries(body: &[u8]) -> Result<Reading, PollError> {
    let entries: Vec<Value> =
        serde_json::from_slice(body).map_err(|e| PollError::Malformed(e.to_string()))?;
    let (latest, previous) = match entries.as_slice() {
        [latest, previous, ..] => (latest, previous),
        _ => {
            return Err(PollError::Malformed(format!(
                "expected two samples, got {}",
                entries.len()
            )))
        }
    };
    let latest = Latest::deserialize(latest)
        .map_err(|e| PollError::Malformed(format!("newest sample: {}", e)))?;
    let previous = Previous::deserialize(previous)
        .map_err(|e| PollError::Malformed(format!("previous sample: {}", e)))?;

    let direction = latest.direction.as_deref().unwrap_or(MISSING_TREND);
    Ok(Reading {
        value: latest.sgv,
        direction: Direction::from_token(direction),
        delta: latest.sgv.saturating_sub(previous.sgv),
    })
}

/// Anything that can hand out the latest reading, blocking until it has one
pub trait ReadingSource {
    fn fetch_reading(&mut self) -> Reading;
}

/// Poller for one Nightscout server
pub struct Nightscout<C, D> {
    client: C,
    url: String,
    retry: RetryPolicy,
    delay: D,
}

impl<C, D> Nightscout<C, D>
where
    C: HttpClient,
    D: DelayNs,
{
    /// `base_url` is the site address, e.g. `https://my.nightscout.site`
    pub fn new(client: C, base_url: &str, retry: RetryPolicy, delay: D) -> Self {
        Self {
            client,
            url: entries_url(base_url),
            retry,
            delay,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// One request, no retry
    pub fn try_fetch(&mut self) -> Result<Reading, PollError> {
        let response = self.client.get(&self.url).map_err(PollError::Transport)?;
        if !response.is_ok() {
            return Err(PollError::Transport(anyhow::anyhow!(
                "{} answered HTTP {}",
                self.url,
                response.status
            )));
        }
        let reading = parse_entries(&response.body)?;
        if let Direction::Unrecognized(token) = &reading.direction {
            log::debug!("Unrecognized trend {:?}", token);
        }
        Ok(reading)
    }
}

impl<C, D> ReadingSource for Nightscout<C, D>
where
    C: HttpClient,
    D: DelayNs,
{
    /// Latest reading, retrying until the server delivers one
    fn fetch_reading(&mut self) -> Reading {
        loop {
            match self.try_fetch() {
                Ok(reading) => {
                    log::info!(
                        "Nightscout: {} {} ({})",
                        reading.value,
                        reading.direction,
                        reading.delta_text()
                    );
                    return reading;
                }
                Err(e @ PollError::Malformed(_)) => log::error!(
                    "Nightscout at {}: {}. Retrying in {} ms",
                    self.url,
                    e,
                    self.retry.delay_ms()
                ),
                Err(e @ PollError::Transport(_)) => log::warn!(
                    "Nightscout at {}: {}. Retrying in {} ms",
                    self.url,
                    e,
                    self.retry.delay_ms()
                ),
            }
            self.delay.delay_ms(self.retry.delay_ms());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeHttp, RecordingDelay};

    const ENTRIES: &str = r#"[
        {"_id":"a","sgv":120,"direction":"Flat","type":"sgv","date":1700000300000},
        {"_id":"b","sgv":110,"direction":"FortyFiveUp","type":"sgv","date":1700000000000}
    ]"#;

    fn poller(http: &FakeHttp, delay: &RecordingDelay) -> Nightscout<FakeHttp, RecordingDelay> {
        Nightscout::new(
            http.clone(),
            "https://my.site/some/page?x=1",
            RetryPolicy::from_secs(5),
            delay.clone(),
        )
    }

    #[test]
    fn url_keeps_scheme_and_authority_only() {
        assert_eq!(
            entries_url("https://my.site:1337/some/page?x=1"),
            "https://my.site:1337/api/v1/entries/sgv.json?count=2"
        );
        assert_eq!(
            entries_url("http://10.0.0.2/"),
            "http://10.0.0.2/api/v1/entries/sgv.json?count=2"
        );
        assert_eq!(
            entries_url("my.site"),
            "https://my.site/api/v1/entries/sgv.json?count=2"
        );
    }

    #[test]
    fn delta_text_is_signed() {
        let reading = |delta| Reading {
            value: 100,
            direction: Direction::Flat,
            delta,
        };
        assert_eq!(reading(10).delta_text(), "+10");
        assert_eq!(reading(0).delta_text(), "0");
        assert_eq!(reading(-7).delta_text(), "-7");
    }

    #[test]
    fn newest_sample_wins() {
        let reading = parse_entries(ENTRIES.as_bytes()).unwrap();
        assert_eq!(
            reading,
            Reading {
                value: 120,
                direction: Direction::Flat,
                delta: 10,
            }
        );
    }

    #[test]
    fn unknown_trend_is_kept() {
        let body = r#"[{"sgv":90,"direction":"NOT COMPUTABLE"},{"sgv":95,"direction":"Flat"}]"#;
        let reading = parse_entries(body.as_bytes()).unwrap();
        assert_eq!(
            reading.direction,
            Direction::Unrecognized("NOT COMPUTABLE".to_owned())
        );
        assert_eq!(reading.delta_text(), "-5");
    }

    #[test]
    fn previous_sample_only_needs_a_value() {
        for body in [
            r#"[{"sgv":120,"direction":"Flat"},{"sgv":110}]"#,
            r#"[{"sgv":120,"direction":"Flat"},{"sgv":110,"direction":null}]"#,
        ] {
            let reading = parse_entries(body.as_bytes()).unwrap();
            assert_eq!(reading.value, 120);
            assert_eq!(reading.direction, Direction::Flat);
            assert_eq!(reading.delta_text(), "+10");
        }
    }

    #[test]
    fn missing_trend_on_newest_is_unrecognized() {
        for body in [
            r#"[{"sgv":90},{"sgv":80,"direction":"Flat"}]"#,
            r#"[{"sgv":90,"direction":null},{"sgv":80}]"#,
        ] {
            let reading = parse_entries(body.as_bytes()).unwrap();
            assert_eq!(reading.direction, Direction::Unrecognized("None".to_owned()));
            assert_eq!(reading.delta, 10);
        }
    }

    #[test]
    fn incomplete_bodies_are_malformed() {
        for body in [
            "",
            "{}",
            "[]",
            r#"[{"sgv":90,"direction":"Flat"}]"#,
            r#"[{"direction":"Flat"},{"sgv":80}]"#,
            r#"[{"sgv":90,"direction":"Flat"},{"direction":"Flat"}]"#,
            r#"[{"sgv":"high","direction":"Flat"},{"sgv":80,"direction":"Flat"}]"#,
        ] {
            assert!(
                matches!(parse_entries(body.as_bytes()), Err(PollError::Malformed(_))),
                "{:?}",
                body
            );
        }
    }

    #[test]
    fn try_fetch_separates_transport_from_malformed() {
        let http = FakeHttp::default();
        http.fail("dns").reply(502, "").reply(200, "[]");
        let mut nightscout = poller(&http, &RecordingDelay::default());
        assert!(matches!(nightscout.try_fetch(), Err(PollError::Transport(_))));
        assert!(matches!(nightscout.try_fetch(), Err(PollError::Transport(_))));
        assert!(matches!(nightscout.try_fetch(), Err(PollError::Malformed(_))));
    }

    #[test]
    fn fetch_retries_every_failure_after_the_delay() {
        let http = FakeHttp::default();
        http.fail("timeout")
            .reply(500, "oops")
            .reply(200, "not json")
            .reply(200, ENTRIES);
        let delay = RecordingDelay::default();
        let mut nightscout = poller(&http, &delay);
        assert_eq!(
            nightscout.url(),
            "https://my.site/api/v1/entries/sgv.json?count=2"
        );

        let reading = nightscout.fetch_reading();
        assert_eq!(reading.value, 120);
        assert_eq!(delay.sleeps(), vec![5000, 5000, 5000]);

        let sent = http.sent();
        assert_eq!(sent.len(), 4);
        assert!(sent.iter().all(|s| s.method == "GET"
            && s.url == "https://my.site/api/v1/entries/sgv.json?count=2"));
    }

    #[test]
    fn fetch_without_failures_does_not_sleep() {
        let http = FakeHttp::default();
        http.reply(200, ENTRIES);
        let delay = RecordingDelay::default();
        poller(&http, &delay).fetch_reading();
        assert!(delay.sleeps().is_empty());
    }
}
