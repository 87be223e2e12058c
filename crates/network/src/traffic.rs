//! Message and byte accounting.
//!
//! Totals are atomics updated once per send or broadcast call: a broadcast
//! to `k` recipients adds `k` messages and `k · size` bytes in one step.
//! Per-kind and per-party breakdowns sit behind `parking_lot` mutexes.
//!
//! # Example
//!
//! ```
//! use mpcsim_core::PartyId;
//! use mpcsim_network::TrafficAnalyzer;
//!
//! let analyzer = TrafficAnalyzer::new();
//! analyzer.record_send(PartyId(0), "Share", 4, 32);
//! assert_eq!(analyzer.totals(), (4, 128));
//! ```

use mpcsim_core::PartyId;
use mpcsim_simulation::SimTime;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Kind under which reliable-broadcast agreement overhead is charged.
pub const AGREEMENT_OVERHEAD: &str = "AgreementOverhead";

#[derive(Debug, Default)]
pub struct TrafficAnalyzer {
    by_kind: Mutex<BTreeMap<String, KindStats>>,
    by_party: Mutex<BTreeMap<PartyId, PartyTraffic>>,
    total_messages: AtomicU64,
    total_bytes: AtomicU64,
}

impl TrafficAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `recipients` copies of a `size`-byte message sent by `from`.
    pub fn record_send(&self, from: PartyId, kind: &str, recipients: usize, size: usize) {
        let messages = recipients as u64;
        let bytes = messages * size as u64;
        self.total_messages.fetch_add(messages, Ordering::Relaxed);
        self.total_bytes.fetch_add(bytes, Ordering::Relaxed);

        self.by_kind
            .lock()
            .entry(kind.to_string())
            .or_default()
            .record(messages, size as u64);
        let mut by_party = self.by_party.lock();
        let party = by_party.entry(from).or_default();
        party.messages_sent += messages;
        party.bytes_sent += bytes;
    }

    /// Record traffic that has no single recipient, such as agreement
    /// overhead.
    pub fn record_overhead(&self, from: PartyId, kind: &str, messages: u64, bytes: u64) {
        self.total_messages.fetch_add(messages, Ordering::Relaxed);
        self.total_bytes.fetch_add(bytes, Ordering::Relaxed);

        let mut by_kind = self.by_kind.lock();
        let stats = by_kind.entry(kind.to_string()).or_default();
        stats.count += messages;
        stats.bytes += bytes;
        drop(by_kind);

        let mut by_party = self.by_party.lock();
        let party = by_party.entry(from).or_default();
        party.messages_sent += messages;
        party.bytes_sent += bytes;
    }

    pub fn record_receive(&self, to: PartyId, size: usize) {
        let mut by_party = self.by_party.lock();
        let party = by_party.entry(to).or_default();
        party.messages_received += 1;
        party.bytes_received += size as u64;
    }

    /// `(messages, bytes)` so far.
    pub fn totals(&self) -> (u64, u64) {
        (
            self.total_messages.load(Ordering::Relaxed),
            self.total_bytes.load(Ordering::Relaxed),
        )
    }

    pub fn generate_report(&self, final_time: SimTime, num_parties: usize) -> BandwidthReport {
        let (total_messages, total_bytes) = self.totals();

        let mut by_kind: Vec<KindReport> = self
            .by_kind
            .lock()
            .iter()
            .map(|(kind, stats)| KindReport {
                kind: kind.clone(),
                count: stats.count,
                pct_of_messages: percent(stats.count, total_messages),
                total_bytes: stats.bytes,
                pct_of_bandwidth: percent(stats.bytes, total_bytes),
                avg_size_bytes: stats.avg_size(),
                min_size_bytes: stats.min_size,
                max_size_bytes: stats.max_size,
            })
            .collect();
        // Largest consumers first; ties keep kind order.
        by_kind.sort_by(|a, b| b.total_bytes.cmp(&a.total_bytes));

        BandwidthReport {
            final_time,
            num_parties,
            total_messages,
            total_bytes,
            by_kind,
            by_party: self.by_party.lock().clone(),
        }
    }
}

#[derive(Debug, Default, Clone)]
struct KindStats {
    count: u64,
    bytes: u64,
    min_size: u64,
    max_size: u64,
}

impl KindStats {
    fn record(&mut self, copies: u64, size: u64) {
        if copies == 0 {
            return;
        }
        if self.count == 0 {
            self.min_size = size;
            self.max_size = size;
        } else {
            self.min_size = self.min_size.min(size);
            self.max_size = self.max_size.max(size);
        }
        self.count += copies;
        self.bytes += copies * size;
    }

    fn avg_size(&self) -> u64 {
        if self.count == 0 {
            0
        } else {
            self.bytes / self.count
        }
    }
}

/// Per-party traffic.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct PartyTraffic {
    pub messages_sent: u64,
    pub messages_received: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

/// Per-kind breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct KindReport {
    pub kind: String,
    pub count: u64,
    pub pct_of_messages: f64,
    pub total_bytes: u64,
    pub pct_of_bandwidth: f64,
    pub avg_size_bytes: u64,
    pub min_size_bytes: u64,
    pub max_size_bytes: u64,
}

/// Traffic summary of a run.
#[derive(Debug, Clone, Serialize)]
pub struct BandwidthReport {
    pub final_time: SimTime,
    pub num_parties: usize,
    pub total_messages: u64,
    pub total_bytes: u64,
    /// Sorted by bandwidth, largest first.
    pub by_kind: Vec<KindReport>,
    pub by_party: BTreeMap<PartyId, PartyTraffic>,
}

impl BandwidthReport {
    pub fn print_summary(&self) {
        println!();
        println!("================== NETWORK TRAFFIC ANALYSIS ==================");
        println!("Simulated Time:         {} ticks", self.final_time);
        println!("Number of Parties:      {}", self.num_parties);
        println!("Total Messages:         {}", self.total_messages);
        println!("Total Bandwidth:        {}", format_bytes(self.total_bytes));
        if self.num_parties > 0 {
            println!(
                "Avg Per-Party:          {} sent",
                format_bytes(self.total_bytes / self.num_parties as u64)
            );
        }
        println!();

        println!("================ BANDWIDTH BY MESSAGE KIND ====================");
        println!(
            "{:<24} {:>10} {:>7} {:>12} {:>7} {:>10}",
            "Message Kind", "Count", "Msg%", "Bytes", "BW%", "Avg Size"
        );
        println!("{}", "-".repeat(74));
        for report in &self.by_kind {
            println!(
                "{:<24} {:>10} {:>6.1}% {:>12} {:>6.1}% {:>10}",
                report.kind,
                report.count,
                report.pct_of_messages,
                format_bytes(report.total_bytes),
                report.pct_of_bandwidth,
                format_bytes(report.avg_size_bytes),
            );
        }
        println!("================================================================");
    }

    /// Print the `top_n` parties by total traffic.
    pub fn print_party_details(&self, top_n: usize) {
        println!();
        println!("================== PER-PARTY BREAKDOWN ========================");

        let mut parties: Vec<_> = self.by_party.iter().collect();
        parties.sort_by_key(|(_, t)| std::cmp::Reverse(t.bytes_sent + t.bytes_received));

        for (party, traffic) in parties.into_iter().take(top_n) {
            println!(
                "{:<6} sent {:>6} msgs / {:>10}   received {:>6} msgs / {:>10}",
                party.to_string(),
                traffic.messages_sent,
                format_bytes(traffic.bytes_sent),
                traffic.messages_received,
                format_bytes(traffic.bytes_received),
            );
        }
        println!("================================================================");
    }
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole > 0 {
        part as f64 / whole as f64 * 100.0
    } else {
        0.0
    }
}

/// Format bytes into a human-readable string.
fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1_000;
    const MB: u64 = 1_000_000;
    const GB: u64 = 1_000_000_000;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
