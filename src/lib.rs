//! # Incident Atlas
//!
//! A backend for visualizing and semantically searching traffic-incident
//! analysis batches from a video-analytics vendor (NomadicML).
//!
//! Batches are fetched from the vendor API or read from an equivalent mock
//! CSV export, normalized into a GeoJSON feature collection, embedded with
//! a sentence-embedding provider, and cached per batch in memory. Free-text
//! queries are answered by a cosine-similarity scan with a score-threshold /
//! top-K policy. A companion renderer produces an interactive Leaflet map
//! of the same data.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌───────────┐
//! │  Connectors  │──▶│   Pipeline   │──▶│  Batch     │
//! │  CSV/Nomadic │   │ Features+Emb │   │  store     │
//! └──────────────┘   └──────────────┘   └─────┬─────┘
//!                                             │
//!                         ┌───────────────────┤
//!                         ▼                   ▼
//!                    ┌──────────┐       ┌──────────┐
//!                    │   CLI    │       │   HTTP   │
//!                    │ (atlas)  │       │  (axum)  │
//!                    └──────────┘       └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! atlas visualize demo-batch            # print the GeoJSON for a batch
//! atlas search demo-batch "pedestrian"  # semantic search (needs embeddings)
//! atlas render demo-batch --out map.html
//! atlas serve                           # start the HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Incident records and GeoJSON feature types |
//! | [`connector_csv`] | Mock dataset (CSV) connector |
//! | [`connector_nomadic`] | Vendor API connector |
//! | [`features`] | Record → feature normalization |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`store`] | Per-batch in-memory cache |
//! | [`search`] | Threshold/top-K similarity search |
//! | [`ingest`] | Pipeline orchestration |
//! | [`video`] | Signed video URL cache |
//! | [`render`] | Leaflet HTML map rendering |
//! | [`server`] | JSON HTTP server |

pub mod config;
pub mod connector_csv;
pub mod connector_nomadic;
pub mod embedding;
pub mod features;
pub mod ingest;
pub mod models;
pub mod render;
pub mod search;
pub mod server;
pub mod store;
pub mod video;
