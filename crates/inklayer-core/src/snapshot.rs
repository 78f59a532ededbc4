//! Flat snapshot encoding of a document's annotation state.
//!
//! The snapshot is a per-page ordered stroke list plus the default pen and
//! marker settings; loading it reproduces identical rendering. There is no
//! format versioning: a snapshot that fails to parse is discarded wholesale
//! in favor of empty strokes rather than partially applied.

use crate::document::InkDocument;
use crate::stroke::{ShapeKind, Stroke, StrokeGeometry, StrokePaint};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Snapshot (de)serialization failure.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotStroke {
    points: Vec<Point>,
    #[serde(flatten)]
    paint: StrokePaint,
    is_shape: bool,
    shape: ShapeKind,
    geometry: StrokeGeometry,
}

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    pages: Vec<Vec<SnapshotStroke>>,
    pen: StrokePaint,
    marker: StrokePaint,
}

/// Encode a document's strokes and tool defaults.
pub fn encode(doc: &InkDocument) -> Result<Vec<u8>, SnapshotError> {
    let snapshot = Snapshot {
        pages: doc
            .pages()
            .iter()
            .map(|strokes| {
                strokes
                    .iter()
                    .map(|stroke| SnapshotStroke {
                        points: stroke.points.clone(),
                        paint: stroke.paint.clone(),
                        is_shape: stroke.is_shape(),
                        shape: stroke.kind(),
                        geometry: stroke.geometry.clone(),
                    })
                    .collect()
            })
            .collect(),
        pen: doc.tools.pen.clone(),
        marker: doc.tools.marker.clone(),
    };
    Ok(serde_json::to_vec(&snapshot)?)
}

/// Apply a snapshot to a document, replacing all strokes and tool defaults.
///
/// A snapshot that fails to parse empties the stroke set: explicit, logged
/// data loss in preference to installing partial state. A page-count
/// mismatch keeps whatever pages both sides have.
pub fn apply(doc: &mut InkDocument, bytes: &[u8]) -> Result<(), SnapshotError> {
    let snapshot: Snapshot = match serde_json::from_slice(bytes) {
        Ok(s) => s,
        Err(err) => {
            log::warn!("discarding unreadable snapshot for {}: {err}", doc.doc_id());
            doc.replace_pages(vec![Vec::new(); doc.page_count()]);
            return Err(err.into());
        }
    };

    if snapshot.pages.len() != doc.page_count() {
        log::warn!(
            "snapshot for {} has {} pages, document has {}",
            doc.doc_id(),
            snapshot.pages.len(),
            doc.page_count()
        );
    }

    let mut pages = vec![Vec::new(); doc.page_count()];
    for (page, strokes) in snapshot.pages.into_iter().enumerate().take(doc.page_count()) {
        pages[page] = strokes
            .into_iter()
            .map(|s| Stroke {
                id: Uuid::new_v4(),
                points: s.points,
                paint: s.paint,
                geometry: s.geometry,
            })
            .collect();
    }
    doc.replace_pages(pages);
    doc.tools.pen = snapshot.pen;
    doc.tools.marker = snapshot.marker;
    Ok(())
}
