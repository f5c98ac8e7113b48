//! In-memory fakes for unit tests

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use anyhow::{anyhow, Result};
use chrono::{DateTime, FixedOffset, TimeZone};
use embedded_hal::delay::DelayNs;

use crate::clock::Clock;
use crate::http::{HttpClient, Response};
use crate::nightscout::{Reading, ReadingSource};

/// Records every requested sleep, in milliseconds. Clones share the record.
#[derive(Debug, Clone, Default)]
pub struct RecordingDelay {
    sleeps: Rc<RefCell<Vec<u32>>>,
}

impl RecordingDelay {
    pub fn sleeps(&self) -> Vec<u32> {
        self.sleeps.borrow().clone()
    }
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.sleeps.borrow_mut().push(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.sleeps.borrow_mut().push(ms);
    }
}

/// One request seen by [`FakeHttp`]
#[derive(Debug, Clone, PartialEq)]
pub struct Sent {
    pub method: &'static str,
    pub url: String,
    pub body: Option<serde_json::Value>,
}

/// Answers with queued replies, falling back to `{"error_code":0}` once the
/// queue is empty.
#[derive(Debug, Clone, Default)]
pub struct FakeHttp {
    replies: Rc<RefCell<VecDeque<Result<Response, String>>>>,
    sent: Rc<RefCell<Vec<Sent>>>,
}

impl FakeHttp {
    pub fn reply(&self, status: u16, body: &str) -> &Self {
        self.replies
            .borrow_mut()
            .push_back(Ok(Response::new(status, body)));
        self
    }

    pub fn fail(&self, message: &str) -> &Self {
        self.replies.borrow_mut().push_back(Err(message.to_owned()));
        self
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.borrow().clone()
    }

    /// `Command` field of every POSTed envelope, in order
    pub fn commands(&self) -> Vec<String> {
        self.sent
            .borrow()
            .iter()
            .filter_map(|sent| sent.body.as_ref())
            .filter_map(|body| body["Command"].as_str().map(str::to_owned))
            .collect()
    }

    fn next(&self) -> Result<Response> {
        match self.replies.borrow_mut().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Ok(Response::new(200, r#"{"error_code":0}"#)),
        }
    }
}

impl HttpClient for FakeHttp {
    fn get(&mut self, url: &str) -> Result<Response> {
        self.sent.borrow_mut().push(Sent {
            method: "GET",
            url: url.to_owned(),
            body: None,
        });
        self.next()
    }

    fn post(&mut self, url: &str, body: &[u8]) -> Result<Response> {
        self.sent.borrow_mut().push(Sent {
            method: "POST",
            url: url.to_owned(),
            body: serde_json::from_slice(body).ok(),
        });
        self.next()
    }
}

/// Always 19:05 on 2025-10-14, UTC
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedClock;

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .and_then(|utc| utc.with_ymd_and_hms(2025, 10, 14, 19, 5, 0).single())
            .unwrap()
    }
}

/// Hands out readings in order, repeating the last one
#[derive(Debug, Clone)]
pub struct Readings {
    queue: VecDeque<Reading>,
}

impl Readings {
    pub fn new(readings: impl IntoIterator<Item = Reading>) -> Self {
        let queue: VecDeque<Reading> = readings.into_iter().collect();
        assert!(!queue.is_empty(), "Readings needs at least one reading");
        Self { queue }
    }
}

impl ReadingSource for Readings {
    fn fetch_reading(&mut self) -> Reading {
        if self.queue.len() > 1 {
            self.queue.pop_front().unwrap()
        } else {
            self.queue[0].clone()
        }
    }
}
