use std::{
    fmt::Display,
    sync::atomic::{AtomicBool, Ordering::SeqCst},
};

static CBCS: AtomicBool = AtomicBool::new(false);

/// Wraps `value` in the SGR colour `code`, restoring the report colour afterwards.
pub fn ansi<T: Display, U: Display>(value: T, code: U) -> String {
    format!("\x1b[{code}m{value}\x1b[0m{}", restore_colour())
}

/// Switches the console reports to the colour-blind-friendly scheme.
pub fn set_cbcs(val: bool) {
    CBCS.store(val, SeqCst)
}

/// Colour code used for figures in the training reports.
pub fn figure_colour() -> i32 {
    if CBCS.load(SeqCst) {
        35
    } else {
        36
    }
}

fn restore_colour() -> &'static str {
    if CBCS.load(SeqCst) {
        "\x1b[38;5;225m"
    } else {
        ""
    }
}

pub fn report_round_finished(round: usize, rounds: usize, loss: f64, round_time: f32, total_time: f32) {
    let colour = figure_colour();

    println!(
        "round {}/{} | time {}s | mean loss {} | total time {}s",
        ansi(round, colour),
        ansi(rounds, colour),
        ansi(format!("{round_time:.2}"), colour),
        ansi(format!("{loss:.6}"), colour),
        ansi(format!("{total_time:.2}"), colour),
    );
}

pub fn report_training_finished(updates: usize, final_loss: f64, total_time: f32) {
    let colour = figure_colour();
    let (hours, minutes, seconds) = seconds_to_hms(total_time as u32);

    println!(
        "Finished {} updates | final loss {} | took {}h {}m {}s",
        ansi(updates, colour),
        ansi(format!("{final_loss:.6}"), colour),
        ansi(hours, colour),
        ansi(minutes, colour),
        ansi(seconds, colour),
    );
}

/// Splits a whole number of seconds into hours, minutes and seconds.
pub fn seconds_to_hms(seconds: u32) -> (u32, u32, u32) {
    (seconds / 3600, seconds / 60 % 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hms() {
        assert_eq!(seconds_to_hms(3725), (1, 2, 5));
        assert_eq!(seconds_to_hms(59), (0, 0, 59));
        assert_eq!(seconds_to_hms(7200), (2, 0, 0));
    }

    #[test]
    fn ansi_wraps_value() {
        assert!(ansi(12, 31).starts_with("\x1b[31m12\x1b[0m"));
    }
}
