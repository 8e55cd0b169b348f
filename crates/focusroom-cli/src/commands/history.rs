use super::{open_app, print_json, CliResult};

pub fn run(limit: Option<usize>) -> CliResult {
    let app = open_app();
    let history = app.timer().history();
    let skip = limit.map_or(0, |n| history.len().saturating_sub(n));
    print_json(&history[skip..])
}
