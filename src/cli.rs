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

use std::path::PathBuf;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap_complete::Shell;

#[derive(Parser, Debug)]
#[command(
    name = "glimpse",
    version,
    about = "Search and grade screenshot text and visual extractions"
)]
pub struct Cli {
    /// Config file (defaults to the global glimpse.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Index extraction records and rank them against a query
    Search(SearchArgs),

    /// Evaluate and index extraction records, then summarize the strategy
    Ingest(IngestArgs),

    /// Score one OCR text and visual description pair
    Evaluate(EvaluateArgs),

    /// Summarize recorded scores per strategy
    Trend(TrendArgs),

    /// Show the scoring rubric
    Rubric {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Print shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Query text (empty lists every record, newest first)
    pub query: String,

    /// Record files or directories
    #[arg(long, required = true)]
    pub input: Vec<PathBuf>,

    /// Glob to include
    #[arg(long)]
    pub glob: Option<String>,

    /// Top-k results (defaults to config default_k)
    #[arg(long)]
    pub k: Option<usize>,

    /// Use lexical ranking even when an embedder is configured
    #[arg(long)]
    pub lexical: bool,

    /// Do not evaluate records that carry no evaluation
    #[arg(long)]
    pub skip_eval: bool,

    /// Include per-signal scores
    #[arg(long)]
    pub explain: bool,

    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Record files or directories
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Glob to include
    #[arg(long)]
    pub glob: Option<String>,

    /// Ignore globs
    #[arg(long)]
    pub ignore: Vec<String>,

    /// Strategy id to record scores under (defaults to config strategy)
    #[arg(long)]
    pub strategy: Option<String>,

    /// Use lexical ranking even when an embedder is configured
    #[arg(long)]
    pub lexical: bool,

    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// OCR text
    #[arg(long, conflicts_with = "ocr_file")]
    pub ocr: Option<String>,

    /// File holding the OCR text
    #[arg(long)]
    pub ocr_file: Option<PathBuf>,

    /// Visual description
    #[arg(long, conflicts_with = "visual_file")]
    pub visual: Option<String>,

    /// File holding the visual description
    #[arg(long)]
    pub visual_file: Option<PathBuf>,

    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct TrendArgs {
    /// JSONL file of {"strategy", "score", "metadata"} lines
    pub path: PathBuf,

    /// Only summarize this strategy
    #[arg(long)]
    pub strategy: Option<String>,

    /// Output JSON
    #[arg(long)]
    pub json: bool,
}
