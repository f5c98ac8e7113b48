//! Fakes shared by the integration tests

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use anyhow::{bail, Result};
use chrono::{DateTime, FixedOffset, TimeZone};
use embedded_hal::delay::DelayNs;
use serde_json::Value;

use nightscout_pixoo::clock::Clock;
use nightscout_pixoo::http::{HttpClient, Response};

#[derive(Default)]
struct Network {
    /// Remaining failures of the Pixoo liveness probe
    probe_failures: u32,
    /// Queued Nightscout replies, the last one repeats
    nightscout: VecDeque<(u16, String)>,
    /// Envelopes POSTed to the Pixoo
    commands: Vec<Value>,
    nightscout_requests: usize,
}

/// Pixoo and Nightscout on one fake network, routed by URL
#[derive(Clone, Default)]
pub struct FakeNetwork {
    inner: Rc<RefCell<Network>>,
}

impl FakeNetwork {
    pub fn failing_probes(self, count: u32) -> Self {
        self.inner.borrow_mut().probe_failures = count;
        self
    }

    pub fn nightscout_reply(self, status: u16, body: &str) -> Self {
        self.inner
            .borrow_mut()
            .nightscout
            .push_back((status, body.to_owned()));
        self
    }

    pub fn commands(&self) -> Vec<Value> {
        self.inner.borrow().commands.clone()
    }

    pub fn command_names(&self) -> Vec<String> {
        self.commands()
            .iter()
            .filter_map(|envelope| envelope["Command"].as_str().map(str::to_owned))
            .collect()
    }

    pub fn nightscout_requests(&self) -> usize {
        self.inner.borrow().nightscout_requests
    }
}

impl HttpClient for FakeNetwork {
    fn get(&mut self, url: &str) -> Result<Response> {
        let mut network = self.inner.borrow_mut();
        if url == "http://pixoo.local/get" {
            if network.probe_failures > 0 {
                network.probe_failures -= 1;
                bail!("connection refused");
            }
            return Ok(Response::new(200, "{}"));
        }
        if url.starts_with("https://ns.example/api/v1/entries/sgv.json") {
            network.nightscout_requests += 1;
            let reply = if network.nightscout.len() > 1 {
                network.nightscout.pop_front()
            } else {
                network.nightscout.front().cloned()
            };
            return match reply {
                Some((status, body)) => Ok(Response::new(status, body)),
                None => bail!("no route to host"),
            };
        }
        bail!("unexpected GET {}", url)
    }

    fn post(&mut self, url: &str, body: &[u8]) -> Result<Response> {
        if url != "http://pixoo.local/post" {
            bail!("unexpected POST {}", url);
        }
        let envelope: Value = serde_json::from_slice(body)?;
        let reply = if envelope["Command"] == "Draw/GetHttpGifId" {
            r#"{"error_code":0,"PicId":0}"#
        } else {
            r#"{"error_code":0}"#
        };
        self.inner.borrow_mut().commands.push(envelope);
        Ok(Response::new(200, reply))
    }
}

/// Records sleeps instead of sleeping
#[derive(Clone, Default)]
pub struct Sleeps {
    record: Rc<RefCell<Vec<u32>>>,
}

impl Sleeps {
    pub fn taken(&self) -> Vec<u32> {
        self.record.borrow().clone()
    }
}

impl DelayNs for Sleeps {
    fn delay_ns(&mut self, ns: u32) {
        self.record.borrow_mut().push(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.record.borrow_mut().push(ms);
    }
}

/// 08:30 in the morning, UTC+2
pub struct MorningClock;

impl Clock for MorningClock {
    fn now(&self) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(2 * 3600)
            .and_then(|offset| offset.with_ymd_and_hms(2025, 3, 1, 8, 30, 0).single())
            .unwrap()
    }
}
