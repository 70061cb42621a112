//! Analyze command - inspect a position reached by a move sequence

use anyhow::{bail, Context, Result};
use clap::Args;

use roadstone_core::{analysis, Color, GameState, Move, Role, Square};
use roadstone_search::{AgentProfile, SearchEngine};

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Board size
    #[arg(long, default_value = "5")]
    pub size: usize,

    /// Profile whose choice to show
    #[arg(long, default_value = "medium")]
    pub profile: String,

    /// Moves in compact notation, from the initial position
    pub moves: Vec<String>,
}

pub fn run(args: AnalyzeArgs, seed: Option<u64>) -> Result<()> {
    let profile = AgentProfile::by_name(&args.profile)
        .with_context(|| format!("Unknown profile: {}", args.profile))?;

    let state = replay(&args)?;

    print_board(&state);
    print_assessment(&state);

    if state.result().is_terminal() {
        println!("result: {:?}", state.result());
        return Ok(());
    }

    let mut engine = SearchEngine::with_seed(profile, seed.unwrap_or(42));
    match engine.select_move(&state) {
        Some(mv) => println!("{} plays: {}", args.profile, mv),
        None => println!("{} has no legal move", args.profile),
    }

    Ok(())
}

fn replay(args: &AnalyzeArgs) -> Result<GameState> {
    let mut state = GameState::new(args.size);
    for (index, text) in args.moves.iter().enumerate() {
        let mv = Move::parse(text)
            .with_context(|| format!("Bad notation at move {}: {}", index + 1, text))?;
        state = match state.apply_move(&mv) {
            Ok(next) => next,
            Err(err) => bail!("Illegal move {} ({}): {}", index + 1, text, err),
        };
    }
    Ok(state)
}

fn print_board(state: &GameState) {
    let size = state.size() as i8;
    for row in (0..size).rev() {
        print!("{} ", row + 1);
        for col in 0..size {
            let sq = Square::new(row, col);
            let glyph = match state.board().top_at(sq) {
                None => '.',
                Some(piece) => piece_glyph(piece.color, piece.role),
            };
            let height = state
                .board()
                .stack_at(sq)
                .map(|s| s.height())
                .unwrap_or(0);
            if height > 1 {
                print!("{}{} ", glyph, height);
            } else {
                print!("{}  ", glyph);
            }
        }
        println!();
    }
    print!("  ");
    for col in 0..size {
        print!("{}  ", (b'a' + col as u8) as char);
    }
    println!();
}

fn piece_glyph(color: Color, role: Role) -> char {
    match (color, role) {
        (Color::White, Role::Flat) => 'w',
        (Color::White, Role::Standing) => 'W',
        (Color::White, Role::Cap) => 'C',
        (Color::Black, Role::Flat) => 'b',
        (Color::Black, Role::Standing) => 'B',
        (Color::Black, Role::Cap) => 'c',
    }
}

fn print_assessment(state: &GameState) {
    let (ws, wc) = state.reserves(Color::White);
    let (bs, bc) = state.reserves(Color::Black);
    println!("reserves: white {}/{}, black {}/{}", ws, wc, bs, bc);
    println!("to move: {:?} (ply {})", state.current_player(), state.ply());

    let white_threats = analysis::threat_squares(state.board(), Color::White, 3);
    let black_threats = analysis::threat_squares(state.board(), Color::Black, 3);
    println!(
        "threats: white {} [{}], black {} [{}]",
        white_threats.len(),
        squares_text(&white_threats),
        black_threats.len(),
        squares_text(&black_threats)
    );

    let mut engine = SearchEngine::new(AgentProfile::medium());
    let score = engine.evaluate_position(state, state.current_player());
    println!("eval (side to move): {:.1}", score);
}

fn squares_text(squares: &[Square]) -> String {
    squares
        .iter()
        .map(|sq| {
            format!(
                "{}{}",
                (b'a' + sq.col as u8) as char,
                (b'1' + sq.row as u8) as char
            )
        })
        .collect::<Vec<_>>()
        .join(" ")
}
