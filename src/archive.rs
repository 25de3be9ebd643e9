/// Output packaging for the export pipeline.
///
/// With neither signature nor certificate the encrypted payload is written
/// as a bare file. Otherwise the output is a ZIP archive with entries in a
/// fixed order and fixed names that downstream tooling matches exactly:
/// `encryptedPrivateKeySignature` (iff signed), `encryptedPrivateKey`
/// (always), `certificate.pem` (iff requested).
///
/// The archive is assembled fully in memory and committed with
/// create-new semantics: an existing destination fails the run and is left
/// untouched, and no partially written file is ever visible.
use std::fs::OpenOptions;
use std::io::{Cursor, Write};
use std::path::Path;

use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::error::{ExportError, Result};

pub const SIGNATURE_ENTRY: &str = "encryptedPrivateKeySignature";
pub const PAYLOAD_ENTRY: &str = "encryptedPrivateKey";
pub const CERTIFICATE_ENTRY: &str = "certificate.pem";

/// Write the export result to `destination`, which must not exist yet.
pub fn write_output(
    destination: &Path,
    signature: Option<&[u8]>,
    payload: &[u8],
    certificate_pem: Option<&[u8]>,
) -> Result<()> {
    let bytes = if signature.is_none() && certificate_pem.is_none() {
        payload.to_vec()
    } else {
        build_zip(signature, payload, certificate_pem)?
    };
    commit(destination, &bytes)
}

fn build_zip(
    signature: Option<&[u8]>,
    payload: &[u8],
    certificate_pem: Option<&[u8]>,
) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    if let Some(signature) = signature {
        writer
            .start_file(SIGNATURE_ENTRY, options)
            .map_err(zip_err)?;
        writer.write_all(signature)?;
    }
    writer.start_file(PAYLOAD_ENTRY, options).map_err(zip_err)?;
    writer.write_all(payload)?;
    if let Some(certificate_pem) = certificate_pem {
        writer
            .start_file(CERTIFICATE_ENTRY, options)
            .map_err(zip_err)?;
        writer.write_all(certificate_pem)?;
    }

    let cursor = writer.finish().map_err(zip_err)?;
    Ok(cursor.into_inner())
}

fn zip_err(e: zip::result::ZipError) -> ExportError {
    ExportError::Io(std::io::Error::new(std::io::ErrorKind::Other, e))
}

/// Single atomic commit point: create the destination fresh, fail if it
/// already exists.
fn commit(destination: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(destination)
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::AlreadyExists {
                ExportError::OutputAlreadyExists(destination.to_path_buf())
            } else {
                ExportError::Io(e)
            }
        })?;
    file.write_all(bytes)?;
    debug!(path = %destination.display(), size = bytes.len(), "output committed");
    Ok(())
}
