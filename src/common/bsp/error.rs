// Copyright © 2018 Cormac O'Brien
//
// Permission is hereby granted, free of charge, to any person obtaining a copy of this software
// and associated documentation files (the "Software"), to deal in the Software without
// restriction, including without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the
// Software is furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all copies or
// substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING
// BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
// DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use std::{
    fmt::{self, Display},
    io,
};

use crate::common::bsp::BspLumpId;

use failure::{Backtrace, Context, Fail};

/// An error that prevents a map file from being loaded.
#[derive(Debug)]
pub struct BspError {
    inner: Context<BspErrorKind>,
}

impl BspError {
    pub fn kind(&self) -> BspErrorKind {
        *self.inner.get_context()
    }
}

impl From<BspErrorKind> for BspError {
    fn from(kind: BspErrorKind) -> Self {
        BspError {
            inner: Context::new(kind),
        }
    }
}

impl From<Context<BspErrorKind>> for BspError {
    fn from(inner: Context<BspErrorKind>) -> Self {
        BspError { inner }
    }
}

impl From<io::Error> for BspError {
    fn from(io_error: io::Error) -> Self {
        io_error.context(BspErrorKind::Io).into()
    }
}

impl From<failure::Error> for BspError {
    fn from(error: failure::Error) -> Self {
        let error = match error.downcast::<BspErrorKind>() {
            Ok(kind) => return kind.into(),
            Err(e) => e,
        };

        match error.downcast::<io::Error>() {
            Ok(io_error) => io_error.into(),
            Err(e) => e.context(BspErrorKind::Malformed).into(),
        }
    }
}

impl Fail for BspError {
    fn cause(&self) -> Option<&dyn Fail> {
        self.inner.cause()
    }

    fn backtrace(&self) -> Option<&Backtrace> {
        self.inner.backtrace()
    }
}

impl Display for BspError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        Display::fmt(&self.inner, f)
    }
}

#[derive(Clone, Copy, Eq, PartialEq, Debug, Fail)]
pub enum BspErrorKind {
    #[fail(display = "I/O error while reading map data")]
    Io,
    #[fail(display = "Bad magic number: expected VBSP, found {:#010x}", found)]
    BadMagic { found: i32 },
    #[fail(
        display = "Lump {:?} is {} bytes, not a multiple of its {}-byte record size",
        lump, size, record_size
    )]
    MisalignedLump {
        lump: BspLumpId,
        size: usize,
        record_size: usize,
    },
    #[fail(display = "Unsupported static prop lump version {}", version)]
    UnsupportedStaticPropVersion { version: u16 },
    #[fail(display = "Tree references {} {} but only {} exist", kind, index, count)]
    BadTreeIndex {
        kind: &'static str,
        index: usize,
        count: usize,
    },
    #[fail(display = "Malformed map data")]
    Malformed,
}

/// A non-fatal irregularity found while loading a map file.
#[derive(Clone, Debug, PartialEq)]
pub enum BspWarning {
    OldVersion { found: i32, minimum: i32 },
    EmptyLump(BspLumpId),
    TooManyRecords { lump: BspLumpId, count: usize, max: usize },
    MissingGameLump([u8; 4]),
}

impl Display for BspWarning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            BspWarning::OldVersion { found, minimum } => write!(
                f,
                "Map version {} is older than {}; loading may produce garbage",
                found, minimum
            ),
            BspWarning::EmptyLump(lump) => write!(f, "Lump {:?} is empty", lump),
            BspWarning::TooManyRecords { lump, count, max } => write!(
                f,
                "Lump {:?} has {} records, more than the engine limit of {}",
                lump, count, max
            ),
            BspWarning::MissingGameLump(id) => write!(
                f,
                "Game lump {} is not present",
                String::from_utf8_lossy(&id)
            ),
        }
    }
}
