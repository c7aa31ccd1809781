//! Compressed binary snapshots of a run, to stop and resume a reduction.

use crate::error::{Error, Result};
use crate::numerics::Real;
use crate::run::{Instance, RunState};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use log::*;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Save the current instance and loop position in `path`.
pub fn save_checkpoint<N: Real, P: AsRef<Path>>(
    path: P,
    instance: &Instance<N>,
    state: &RunState,
) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    bincode::serialize_into(&mut encoder, &(state, instance)).map_err(|source| {
        Error::Snapshot {
            path: path.into(),
            source,
        }
    })?;
    encoder
        .finish()
        .and_then(|mut w| w.flush())
        .map_err(|e| Error::io(path, e))?;
    debug!("Checkpoint written in {}", path.display());
    Ok(())
}

/// Load a snapshot written by `save_checkpoint`.
pub fn load_checkpoint<N: Real, P: AsRef<Path>>(path: P) -> Result<(Instance<N>, RunState)> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut decoder = GzDecoder::new(BufReader::new(file));
    let (state, instance): (RunState, Instance<N>) = bincode::deserialize_from(&mut decoder)
        .map_err(|source| Error::Snapshot {
            path: path.into(),
            source,
        })?;
    info!(
        "Resuming from {} at round {} stage {}",
        path.display(),
        state.round,
        state.stage
    );
    Ok((instance, state))
}
