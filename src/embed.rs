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

use anyhow::Context;
use anyhow::Result;
use model2vec_rs::model::StaticModel;
use sha2::Digest;
use sha2::Sha256;

use crate::config::Config;

pub const EMBEDDING_HASH: &str = "hash";
pub const EMBEDDING_MODEL2VEC: &str = "model2vec";
pub const EMBEDDING_NONE: &str = "none";

/// Deterministic text-to-vector function shared by documents and queries.
pub trait Embedder: Send + Sync {
    fn name(&self) -> &'static str;
    fn embed(&self, text: &str) -> Vec<f32>;
}

/// Builds the configured embedder. `Ok(None)` means embeddings are disabled.
pub fn build_embedder(config: &Config) -> Result<Option<Box<dyn Embedder>>> {
    let name = config.embedding.trim().to_lowercase();
    match name.as_str() {
        EMBEDDING_NONE => Ok(None),
        EMBEDDING_HASH => Ok(Some(Box::new(HashEmbedder::new(config.embedding_dim)))),
        EMBEDDING_MODEL2VEC => Ok(Some(Box::new(Model2VecEmbedder::load(&config.model)?))),
        _ => anyhow::bail!(
            "unsupported embedding '{}'; supported: {}, {} or {}",
            config.embedding,
            EMBEDDING_MODEL2VEC,
            EMBEDDING_HASH,
            EMBEDDING_NONE
        ),
    }
}

#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }
}

impl Embedder for HashEmbedder {
    fn name(&self) -> &'static str {
        EMBEDDING_HASH
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vec = vec![0.0f32; self.dim];
        for token in tokens(text) {
            let (idx, sign) = hash_token_feature(&token, self.dim);
            vec[idx] += sign;
        }
        l2_normalize(vec)
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

pub struct Model2VecEmbedder {
    model: StaticModel,
}

impl Model2VecEmbedder {
    pub fn load(repo_or_path: &str) -> Result<Self> {
        let model = StaticModel::from_pretrained(repo_or_path, None, None, None)
            .with_context(|| format!("load model2vec model '{repo_or_path}'"))?;
        Ok(Self { model })
    }
}

impl Embedder for Model2VecEmbedder {
    fn name(&self) -> &'static str {
        EMBEDDING_MODEL2VEC
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        self.model
            .encode(&[text.to_string()])
            .into_iter()
            .next()
            .unwrap_or_default()
    }
}

fn l2_normalize(mut vec: Vec<f32>) -> Vec<f32> {
    let mut norm = 0.0f32;
    for v in &vec {
        norm += v * v;
    }
    if norm > 0.0 {
        let inv = 1.0 / norm.sqrt();
        for v in &mut vec {
            *v *= inv;
        }
    }
    vec
}

fn hash_token_feature(token: &str, dim: usize) -> (usize, f32) {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let hash = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash[..8]);
    let val = u64::from_le_bytes(bytes);
    let idx = (val as usize) % dim;
    let sign = if (val & (1 << 63)) != 0 { 1.0 } else { -1.0 };
    (idx, sign)
}

/// Cosine similarity; 0 for mismatched lengths, zero vectors, or NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let sim = dot / (norm_a.sqrt() * norm_b.sqrt());
    if sim.is_nan() { 0.0 } else { sim }
}
