//! Sandboxed page rasterizer
//!
//! Spawned per render by the server. Reads one JSON job line plus PDF bytes
//! from stdin, writes PNG bytes to stdout. Untrusted document decoding
//! happens here, isolated from the request-handling process; the parent
//! enforces the wall-clock timeout and kills this process when it fires.

use std::process::ExitCode;

fn main() -> ExitCode {
    folio_server::render::worker::run()
}
