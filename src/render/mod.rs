// SPDX-FileCopyrightText: 2026 GSI Helmholtzzentrum f. Schwerionenforschung GmbH, Darmstadt, Germany
// SPDX-License-Identifier: LGPL-3.0-or-later

pub mod canvas;
pub mod map;
pub mod text;

pub use canvas::FileDisplay;
pub use map::{DisplaySurface, MapRenderer};
pub use text::{PlainSurface, TerminalSurface, TextRenderer};
