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

//! Hybrid search and rubric grading for screenshot extractions.

pub mod cli;
pub mod config;
pub mod embed;
pub mod evaluate;
pub mod ingest;
pub mod lexical;
pub mod logging;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod rubric;
pub mod search;
pub mod semantic;
pub mod store;
pub mod tracker;
