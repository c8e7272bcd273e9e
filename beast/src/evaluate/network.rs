//! Neural-network evaluation, backed by ONNX models.
//!
//! Models are self-describing: the input layout and the output scaling are
//! selected from the metadata embedded in the model file, so both the old
//! `(7, 8, 8)` signed-plane nets and the newer `(17, 8, 8)` one-hot nets
//! keep working. The network outputs a win probability in `[0, 1]`, which
//! gets converted to centipawns according to the model's declared scaling.

use crate::evaluate::Score;
use crate::position::Position;
use anyhow::anyhow;
use anyhow::Context;
use shakmaty::CastlingSide;
use shakmaty::Color;
use shakmaty::Position as _;
use shakmaty::Role;
use std::path::Path;
use tract_onnx::prelude::tract_ndarray::Array4;
use tract_onnx::prelude::*;

/// The input tensor layout, keyed by the `model_version` metadata entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum InputVersion {
    /// `(7, 8, 8)`: six piece planes holding +1 for white and -1 for black,
    /// plus a side-to-move plane.
    V1,

    /// `(17, 8, 8)`: twelve one-hot piece planes, a side-to-move plane, and
    /// four castling-rights planes.
    V2,
}

impl InputVersion {
    fn from_metadata(value: Option<&str>) -> anyhow::Result<Self> {
        match value {
            Some("v1") | Some("V1") => Ok(Self::V1),

            Some("v2") | Some("V2") => Ok(Self::V2),

            // Models that predate the metadata convention are all v1
            None => Ok(Self::V1),

            Some(other) => Err(anyhow!("Unknown model version: {other}")),
        }
    }

    fn planes(self) -> usize {
        match self {
            Self::V1 => 7,
            Self::V2 => 17,
        }
    }
}

/// How the model's win-probability output maps to centipawns.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum OutputScale {
    /// The historic convention: `cp = round(p * 2000)`
    Legacy,

    /// Probability-calibrated models: `cp = 400 * log10(p / (1 - p))`
    LogOdds,
}

impl OutputScale {
    fn from_metadata(value: Option<&str>, version: InputVersion) -> anyhow::Result<Self> {
        match value {
            Some("legacy") => Ok(Self::Legacy),

            Some("log_odds") | Some("logodds") => Ok(Self::LogOdds),

            None => Ok(match version {
                InputVersion::V1 => Self::Legacy,
                InputVersion::V2 => Self::LogOdds,
            }),

            Some(other) => Err(anyhow!("Unknown score scale: {other}")),
        }
    }

    fn to_centipawns(self, probability: f32) -> Score {
        match self {
            Self::Legacy => (probability * 2000.0).round() as Score,

            Self::LogOdds => {
                let p = probability.clamp(1e-9, 1.0 - 1e-9) as f64;
                (400.0 * (p / (1.0 - p)).log10()).round() as Score
            }
        }
    }
}

/// A loaded, ready-to-run evaluation network.
pub struct Network {
    model: TypedRunnableModel<TypedModel>,
    version: InputVersion,
    scale: OutputScale,
}

impl Network {
    /// Load a network from an ONNX model file. Fails when the file is
    /// missing, not a readable model, or carries metadata we don't support.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let proto = tract_onnx::onnx()
            .proto_model_for_path(path)
            .with_context(|| format!("Failed to read model file {}", path.display()))?;

        let metadata = |key: &str| {
            proto
                .metadata_props
                .iter()
                .find(|prop| prop.key == key)
                .map(|prop| prop.value.as_str())
        };

        let version = InputVersion::from_metadata(metadata("model_version"))?;
        let scale = OutputScale::from_metadata(metadata("score_scale"), version)?;

        let model = tract_onnx::onnx()
            .model_for_path(path)?
            .with_input_fact(0, f32::fact([1, version.planes(), 8, 8]).into())?
            .into_optimized()?
            .into_runnable()?;

        Ok(Self {
            model,
            version,
            scale,
        })
    }

    /// Run the forward pass and return the position's value in centipawns.
    /// The model's output is the side to move's win probability, so the
    /// score comes out side-relative without further bookkeeping.
    pub fn evaluate(&self, pos: &Position) -> anyhow::Result<Score> {
        let input: Tensor = match self.version {
            InputVersion::V1 => encode_v1(pos).into(),
            InputVersion::V2 => encode_v2(pos).into(),
        };

        let output = self.model.run(tvec!(input.into()))?;
        let probability = output[0]
            .to_array_view::<f32>()?
            .iter()
            .next()
            .copied()
            .context("Model produced an empty output")?;

        Ok(self.scale.to_centipawns(probability))
    }
}

/// The plane index for a piece type, in pawn-to-king order.
fn role_plane(role: Role) -> usize {
    match role {
        Role::Pawn => 0,
        Role::Knight => 1,
        Role::Bishop => 2,
        Role::Rook => 3,
        Role::Queen => 4,
        Role::King => 5,
    }
}

/// Board orientation matches the FEN reading order: row 0 is the eighth
/// rank, column 0 is the a-file.
fn square_coords(square: shakmaty::Square) -> (usize, usize) {
    (7 - square.rank() as usize, square.file() as usize)
}

/// Fill an entire 8x8 plane with a single value.
fn fill_plane(planes: &mut Array4<f32>, plane: usize, value: f32) {
    for row in 0..8 {
        for col in 0..8 {
            planes[[0, plane, row, col]] = value;
        }
    }
}

fn encode_v1(pos: &Position) -> Array4<f32> {
    let mut planes = Array4::zeros((1, 7, 8, 8));

    let side_to_move = if pos.turn() == Color::White { 1.0 } else { -1.0 };
    fill_plane(&mut planes, 6, side_to_move);

    for square in pos.board().board().occupied() {
        if let Some(piece) = pos.piece_at(square) {
            let (row, col) = square_coords(square);
            let value = if piece.color == Color::White { 1.0 } else { -1.0 };

            planes[[0, role_plane(piece.role), row, col]] = value;
        }
    }

    planes
}

fn encode_v2(pos: &Position) -> Array4<f32> {
    let mut planes = Array4::zeros((1, 17, 8, 8));

    for square in pos.board().board().occupied() {
        if let Some(piece) = pos.piece_at(square) {
            let (row, col) = square_coords(square);
            let offset = if piece.color == Color::White { 0 } else { 6 };

            planes[[0, offset + role_plane(piece.role), row, col]] = 1.0;
        }
    }

    if pos.turn() == Color::White {
        fill_plane(&mut planes, 12, 1.0);
    }

    let castles = pos.board().castles();
    let rights = [
        (Color::White, CastlingSide::KingSide),
        (Color::White, CastlingSide::QueenSide),
        (Color::Black, CastlingSide::KingSide),
        (Color::Black, CastlingSide::QueenSide),
    ];

    for (plane, (color, side)) in rights.into_iter().enumerate() {
        if castles.has(color, side) {
            fill_plane(&mut planes, 13 + plane, 1.0);
        }
    }

    planes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn v1_encodes_signed_piece_planes() {
        let planes = encode_v1(&Position::new());

        // White pawn on a2 (row 6), black pawn on a7 (row 1)
        assert_eq!(planes[[0, 0, 6, 0]], 1.0);
        assert_eq!(planes[[0, 0, 1, 0]], -1.0);

        // White king on e1, black king on e8
        assert_eq!(planes[[0, 5, 7, 4]], 1.0);
        assert_eq!(planes[[0, 5, 0, 4]], -1.0);

        // Empty square
        assert_eq!(planes[[0, 0, 4, 4]], 0.0);

        // White to move
        assert_eq!(planes[[0, 6, 0, 0]], 1.0);
        assert_eq!(planes[[0, 6, 7, 7]], 1.0);
    }

    #[test]
    fn v1_side_to_move_plane_is_negative_for_black() {
        let mut pos = Position::new();
        pos.push_uci(&"e2e4".parse().unwrap()).unwrap();

        let planes = encode_v1(&pos);

        assert_eq!(planes[[0, 6, 0, 0]], -1.0);
    }

    #[test]
    fn v2_encodes_one_hot_piece_planes() {
        let planes = encode_v2(&Position::new());

        // White pawn plane 0, black pawn plane 6
        assert_eq!(planes[[0, 0, 6, 0]], 1.0);
        assert_eq!(planes[[0, 6, 1, 0]], 1.0);
        assert_eq!(planes[[0, 0, 1, 0]], 0.0);

        // Kings: white plane 5 on e1, black plane 11 on e8
        assert_eq!(planes[[0, 5, 7, 4]], 1.0);
        assert_eq!(planes[[0, 11, 0, 4]], 1.0);

        // Side to move and all four castling rights
        assert_eq!(planes[[0, 12, 3, 3]], 1.0);
        for plane in 13..17 {
            assert_eq!(planes[[0, plane, 0, 0]], 1.0);
        }
    }

    #[test]
    fn v2_castling_planes_follow_the_rights() {
        // Only white can still castle kingside
        let pos = Position::from_fen(
            "rnbqk1nr/pppp1ppp/8/4p3/1b1P4/8/PPP1PPPP/RNBQKBNR w KQ - 2 3",
        )
        .unwrap();

        let planes = encode_v2(&pos);

        assert_eq!(planes[[0, 13, 0, 0]], 1.0);
        assert_eq!(planes[[0, 14, 0, 0]], 1.0);
        assert_eq!(planes[[0, 15, 0, 0]], 0.0);
        assert_eq!(planes[[0, 16, 0, 0]], 0.0);
    }

    #[test]
    fn input_version_defaults_to_v1() {
        assert_eq!(InputVersion::from_metadata(None).unwrap(), InputVersion::V1);
        assert_eq!(
            InputVersion::from_metadata(Some("v2")).unwrap(),
            InputVersion::V2
        );
        assert!(InputVersion::from_metadata(Some("v3")).is_err());
    }

    #[test]
    fn output_scale_follows_the_version_by_default() {
        let legacy = OutputScale::from_metadata(None, InputVersion::V1).unwrap();
        let log_odds = OutputScale::from_metadata(None, InputVersion::V2).unwrap();

        assert_eq!(legacy, OutputScale::Legacy);
        assert_eq!(log_odds, OutputScale::LogOdds);
    }

    #[test]
    fn output_scaling_conversions() {
        assert_eq!(OutputScale::Legacy.to_centipawns(0.5), 1000);
        assert_eq!(OutputScale::Legacy.to_centipawns(0.0), 0);

        // Even odds are an even game
        assert_eq!(OutputScale::LogOdds.to_centipawns(0.5), 0);

        // ~75% win probability is roughly a two-pawn advantage
        let advantage = OutputScale::LogOdds.to_centipawns(0.75);
        assert!((150..250).contains(&advantage), "got {advantage}");

        // Saturated probabilities stay finite
        assert!(OutputScale::LogOdds.to_centipawns(1.0) > 3000);
        assert!(OutputScale::LogOdds.to_centipawns(0.0) < -3000);
    }

    #[test]
    fn loading_a_missing_model_fails() {
        assert!(Network::load(Path::new("/does/not/exist.onnx")).is_err());
    }
}
