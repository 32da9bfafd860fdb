// SPDX-FileCopyrightText: 2026 GSI Helmholtzzentrum f. Schwerionenforschung GmbH, Darmstadt, Germany
// SPDX-License-Identifier: LGPL-3.0-or-later

//! Job-state ingestion.
//!
//! Architecture:
//! - Source: hands over the controller's latest record, or nothing
//! - Poller: fetches once per cadence and installs valid records
//! - Store: latest-value cell shared with the renderers

pub mod poller;
pub mod source;
pub mod store;
pub mod types;

pub use poller::Poller;
pub use source::{FileSource, SnapshotSource};
pub use store::{JobStateStore, StoreReader};
pub use types::JobStateSnapshot;
