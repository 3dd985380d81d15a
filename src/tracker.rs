// Copyright 2026 Glimpse Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Rolling score history per extraction strategy.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;

const TREND_WINDOW: usize = 5;
const TREND_DELTA: f64 = 5.0;
const RECENT_SCORES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
    NoData,
}

impl Trend {
    pub fn as_label(self) -> &'static str {
        match self {
            Trend::Improving => "improving",
            Trend::Declining => "declining",
            Trend::Stable => "stable",
            Trend::NoData => "no_data",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreEntry {
    pub score: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub metadata: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceSummary {
    pub version: String,
    pub total_uses: usize,
    pub average_score: f64,
    pub min_score: f64,
    pub max_score: f64,
    pub trend: Trend,
    pub recent_scores: Vec<f64>,
}

#[derive(Debug, Default)]
pub struct PerformanceTracker {
    records: BTreeMap<String, Vec<ScoreEntry>>,
}

impl PerformanceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, strategy_id: &str, score: f64, metadata: Value) {
        self.record_at(strategy_id, score, metadata, OffsetDateTime::now_utc());
    }

    pub fn record_at(
        &mut self,
        strategy_id: &str,
        score: f64,
        metadata: Value,
        timestamp: OffsetDateTime,
    ) {
        let score = if score.is_finite() { score } else { 0.0 };
        self.records
            .entry(strategy_id.to_string())
            .or_default()
            .push(ScoreEntry {
                score,
                timestamp,
                metadata,
            });
    }

    pub fn entries(&self, strategy_id: &str) -> &[ScoreEntry] {
        self.records
            .get(strategy_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn strategies(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn summarize(&self, strategy_id: &str) -> PerformanceSummary {
        let scores: Vec<f64> = self.entries(strategy_id).iter().map(|e| e.score).collect();
        if scores.is_empty() {
            return PerformanceSummary {
                version: strategy_id.to_string(),
                total_uses: 0,
                average_score: 0.0,
                min_score: 0.0,
                max_score: 0.0,
                trend: Trend::NoData,
                recent_scores: Vec::new(),
            };
        }

        let average = mean(&scores);
        let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let recent_start = scores.len().saturating_sub(RECENT_SCORES);

        PerformanceSummary {
            version: strategy_id.to_string(),
            total_uses: scores.len(),
            average_score: (average * 100.0).round() / 100.0,
            min_score: min,
            max_score: max,
            trend: trend(&scores),
            recent_scores: scores[recent_start..].to_vec(),
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn trend(scores: &[f64]) -> Trend {
    if scores.len() < TREND_WINDOW * 2 {
        return Trend::Stable;
    }
    let n = scores.len();
    let recent = mean(&scores[n - TREND_WINDOW..]);
    let previous = mean(&scores[n - TREND_WINDOW * 2..n - TREND_WINDOW]);
    if recent > previous + TREND_DELTA {
        Trend::Improving
    } else if recent < previous - TREND_DELTA {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn tracker_with(strategy: &str, scores: &[f64]) -> PerformanceTracker {
        let mut tracker = PerformanceTracker::new();
        for score in scores {
            tracker.record(strategy, *score, json!({}));
        }
        tracker
    }

    #[test]
    fn empty_strategy_has_no_data() {
        let tracker = PerformanceTracker::new();
        let summary = tracker.summarize("v1");
        assert_eq!(summary.trend, Trend::NoData);
        assert_eq!(summary.total_uses, 0);
        assert_eq!(summary.average_score, 0.0);
        assert!(summary.recent_scores.is_empty());
    }

    #[test]
    fn short_history_is_stable() {
        let tracker = tracker_with("v1", &[10.0, 90.0, 10.0, 90.0, 10.0, 90.0, 10.0, 90.0, 99.0]);
        let summary = tracker.summarize("v1");
        assert_eq!(summary.trend, Trend::Stable);
        assert_eq!(summary.total_uses, 9);
        assert_eq!(summary.recent_scores.len(), 9);
    }

    #[test]
    fn detects_improvement_and_decline() {
        let rising = [50.0, 50.0, 50.0, 50.0, 50.0, 60.0, 60.0, 60.0, 60.0, 60.0];
        let tracker = tracker_with("v1", &rising);
        assert_eq!(tracker.summarize("v1").trend, Trend::Improving);

        let falling: Vec<f64> = rising.iter().rev().copied().collect();
        let tracker = tracker_with("v1", &falling);
        assert_eq!(tracker.summarize("v1").trend, Trend::Declining);

        let flat = [50.0, 50.0, 50.0, 50.0, 50.0, 54.0, 54.0, 54.0, 54.0, 54.0];
        let tracker = tracker_with("v1", &flat);
        assert_eq!(tracker.summarize("v1").trend, Trend::Stable);
    }

    #[test]
    fn trend_uses_last_ten_entries() {
        let mut scores = vec![0.0; 20];
        scores.extend([70.0, 70.0, 70.0, 70.0, 70.0, 70.0, 70.0, 70.0, 70.0, 70.0]);
        let tracker = tracker_with("v1", &scores);
        let summary = tracker.summarize("v1");
        assert_eq!(summary.trend, Trend::Stable);
        assert_eq!(summary.recent_scores, vec![70.0; 10]);
        assert_eq!(summary.min_score, 0.0);
        assert_eq!(summary.max_score, 70.0);
        assert_eq!(summary.average_score, 23.33);
    }

    #[test]
    fn strategies_are_independent() {
        let mut tracker = PerformanceTracker::new();
        tracker.record("v1", 0.5, json!({"name": "a.png"}));
        tracker.record("v2", f64::NAN, json!(null));
        assert_eq!(tracker.summarize("v1").total_uses, 1);
        assert_eq!(tracker.summarize("v2").max_score, 0.0);
        assert_eq!(tracker.strategies().collect::<Vec<_>>(), vec!["v1", "v2"]);
        assert_eq!(tracker.entries("v1")[0].metadata["name"], "a.png");
    }
}
