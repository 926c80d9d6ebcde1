//! Core domain logic and static build orchestration for CourseHub.
//!
//! This crate ties together domain classification, relationship finding,
//! learning-path sequencing, search and the static export (`build_site`).

pub mod classifier;
pub mod debounce;
pub mod export;
pub mod pages;
pub mod pipeline;
pub mod relations;
pub mod search;
pub mod seo;
pub mod sequencer;
pub mod sitemap;
