use clap::Subcommand;

use super::{open_app, print_json, CliResult};

#[derive(Subcommand)]
pub enum ProgressAction {
    /// Streak, weekly and lifetime focus time
    Show,
    /// All achievements with their progress
    Achievements {
        /// Only list unlocked achievements
        #[arg(long)]
        unlocked: bool,
    },
}

pub fn run(action: ProgressAction) -> CliResult {
    let app = open_app();

    match action {
        ProgressAction::Show => print_json(&app.snapshot().progress),
        ProgressAction::Achievements { unlocked } => {
            let achievements: Vec<_> = app
                .progress()
                .achievements()
                .iter()
                .filter(|a| !unlocked || a.unlocked)
                .collect();
            print_json(&achievements)
        }
    }
}
