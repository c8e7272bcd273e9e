//! Most of the core logic concerning `Position`s lives in this module
//!
//! A `Position` is a thin wrapper around the chess backend's board that adds
//! the two things the search needs and the backend doesn't provide: an undo
//! stack, so the recursion can `push`/`pop` moves on a single board, and a
//! zobrist history, so repetitions can be detected and positions can be used
//! as transposition table keys.

use anyhow::anyhow;
use shakmaty::fen::Fen;
use shakmaty::uci::UciMove;
use shakmaty::zobrist::Zobrist64;
use shakmaty::zobrist::ZobristHash;
use shakmaty::CastlingMode;
use shakmaty::Chess;
use shakmaty::Color;
use shakmaty::EnPassantMode;
use shakmaty::Move;
use shakmaty::MoveList;
use shakmaty::Piece;
use shakmaty::Position as _;
use shakmaty::Role;
use shakmaty::Square;

/// A board position, together with the stack of previous positions that led
/// up to it.
#[derive(Debug, Clone)]
pub struct Position {
    /// The current board state
    board: Chess,

    /// The boards we passed through to get here, most recent last
    stack: Vec<Chess>,

    /// The zobrist keys matching `stack`, used for repetition detection
    keys: Vec<Zobrist64>,

    /// The zobrist key of the current board
    key: Zobrist64,
}

impl Position {
    /// Create a position from the standard starting position.
    pub fn new() -> Self {
        Self::from_board(Chess::default())
    }

    /// Create a position from a FEN string.
    pub fn from_fen(fen: &str) -> anyhow::Result<Self> {
        let fen: Fen = fen.parse()?;
        let board: Chess = fen.into_position(CastlingMode::Standard)?;

        Ok(Self::from_board(board))
    }

    fn from_board(board: Chess) -> Self {
        let key = board.zobrist_hash(EnPassantMode::Legal);

        Self {
            board,
            stack: Vec::new(),
            keys: Vec::new(),
            key,
        }
    }

    /// The backend board itself. Only the evaluation layer should need this,
    /// for tablebase probes and network input encoding.
    pub(crate) fn board(&self) -> &Chess {
        &self.board
    }

    /// The zobrist key of the current board.
    pub fn key(&self) -> u64 {
        self.key.0
    }

    ////////////////////////////////////////////////////////////////////////////
    //
    // Making and unmaking moves
    //
    ////////////////////////////////////////////////////////////////////////////

    /// Play a move on the board. The move must be legal.
    pub fn push(&mut self, mv: &Move) {
        self.stack.push(self.board.clone());
        self.keys.push(self.key);
        self.board.play_unchecked(mv);
        self.key = self.board.zobrist_hash(EnPassantMode::Legal);
    }

    /// Pass the turn without playing a move, as a pruning probe. Returns
    /// false (and leaves the position untouched) when the backend refuses,
    /// e.g. because the side to move is in check.
    pub fn push_null(&mut self) -> bool {
        match self.board.clone().swap_turn() {
            Ok(swapped) => {
                self.stack.push(self.board.clone());
                self.keys.push(self.key);
                self.board = swapped;
                self.key = self.board.zobrist_hash(EnPassantMode::Legal);
                true
            }
            Err(_) => false,
        }
    }

    /// Undo the most recent `push` or `push_null`.
    pub fn pop(&mut self) {
        debug_assert!(!self.stack.is_empty(), "pop on an empty move stack");

        if let (Some(board), Some(key)) = (self.stack.pop(), self.keys.pop()) {
            self.board = board;
            self.key = key;
        }
    }

    /// Parse and apply a move in UCI notation. Fails on illegal moves and
    /// leaves the position untouched.
    pub fn push_uci(&mut self, mv: &UciMove) -> anyhow::Result<()> {
        let mv = mv
            .to_move(&self.board)
            .map_err(|_| anyhow!("Illegal move: {mv}"))?;

        self.push(&mv);
        Ok(())
    }

    ////////////////////////////////////////////////////////////////////////////
    //
    // Move and game state queries
    //
    ////////////////////////////////////////////////////////////////////////////

    /// All legal moves in the current position.
    pub fn legal_moves(&self) -> MoveList {
        self.board.legal_moves()
    }

    pub fn turn(&self) -> Color {
        self.board.turn()
    }

    pub fn in_check(&self) -> bool {
        self.board.is_check()
    }

    pub fn is_checkmate(&self) -> bool {
        self.board.is_checkmate()
    }

    pub fn is_stalemate(&self) -> bool {
        self.board.is_stalemate()
    }

    pub fn is_insufficient_material(&self) -> bool {
        self.board.is_insufficient_material()
    }

    /// Whether the game has ended by rule (mate, stalemate or dead position).
    /// Claimable draws are checked separately by the search.
    pub fn is_game_over(&self) -> bool {
        self.is_checkmate() || self.is_stalemate() || self.is_insufficient_material()
    }

    /// Whether the current board has occurred at least `count` times on the
    /// stack, the current occurrence included.
    pub fn is_repetition(&self, count: usize) -> bool {
        let seen = self.keys.iter().filter(|&&key| key == self.key).count();

        seen + 1 >= count
    }

    /// Whether a draw could be claimed under the fifty-move rule.
    pub fn is_fifty_move_claimable(&self) -> bool {
        self.board.halfmoves() >= 100
    }

    pub fn is_capture(&self, mv: &Move) -> bool {
        mv.is_capture()
    }

    pub fn is_en_passant(&self, mv: &Move) -> bool {
        mv.is_en_passant()
    }

    /// Whether playing the move would leave the opponent in check.
    pub fn gives_check(&self, mv: &Move) -> bool {
        let mut board = self.board.clone();
        board.play_unchecked(mv);
        board.is_check()
    }

    ////////////////////////////////////////////////////////////////////////////
    //
    // Piece placement queries
    //
    ////////////////////////////////////////////////////////////////////////////

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.board.board().piece_at(square)
    }

    pub fn piece_type_at(&self, square: Square) -> Option<Role> {
        self.board.board().role_at(square)
    }

    /// The squares holding pieces of the given type and color.
    pub fn pieces(&self, role: Role, color: Color) -> shakmaty::Bitboard {
        self.board.board().by_piece(Piece { color, role })
    }

    pub fn king(&self, color: Color) -> Option<Square> {
        self.board.board().king_of(color)
    }

    /// The total number of pieces on the board, kings and pawns included.
    pub fn piece_count(&self) -> usize {
        self.board.board().occupied().count()
    }

    /// The current board as a FEN string.
    pub fn fen(&self) -> String {
        Fen::from_position(self.board.clone(), EnPassantMode::Legal).to_string()
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}
