use std::path::PathBuf;

use booking::domain::{CalendarCell, NavigationDirection};
use booking::{simulated_controller, BookingConfig, CalendarGrid, LogNotifier, Notifier};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn render_text(grid: &CalendarGrid) -> String {
    let mut out = format!("{:^35}\n", grid.title);
    out.push_str(
        &grid
            .weekday_labels()
            .iter()
            .map(|label| format!("{:>5}", label))
            .collect::<String>(),
    );
    out.push('\n');
    for row in grid.rows() {
        for cell in row {
            let text = match cell {
                CalendarCell::PaddingBefore { day } => format!("({})", day),
                CalendarCell::MonthDay(day) if !day.is_interactive() => format!("{}x", day.day),
                CalendarCell::MonthDay(day) if day.is_selected => format!("[{}]", day.day),
                CalendarCell::MonthDay(day) => day.day.to_string(),
            };
            out.push_str(&format!("{:>5}", text));
        }
        out.push('\n');
    }
    out
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = BookingConfig::load(config_path.as_deref())?;
    let controller = simulated_controller(&config)?;

    info!("Loading availability for the current month");
    controller.initialize();
    controller.wait_for_month().await;

    let mut grid = controller.grid();
    if grid.month_days().all(|day| !day.is_interactive()) {
        info!("No bookable days left in {}, moving to next month", grid.title);
        controller.navigate(NavigationDirection::Next);
        controller.wait_for_month().await;
        grid = controller.grid();
    }
    println!("{}", render_text(&grid));

    let Some(date) = grid.month_days().find(|day| day.is_interactive()).map(|day| day.date) else {
        warn!("No bookable day found");
        return Ok(());
    };
    controller.select_date(&date.to_string())?;
    controller.wait_for_slots().await;

    let board = controller.slot_board();
    for slot in board.controls() {
        println!("  {:>8}  {}", slot.label, if slot.enabled { "open" } else { "booked" });
    }

    let notifier = LogNotifier::new(&config.alerts);
    match board.controls().iter().find(|slot| slot.enabled) {
        Some(slot) => {
            controller.select_time_slot(&slot.time.to_string())?;
            let selection = controller.selection();
            println!("{}", serde_json::to_string_pretty(&selection)?);
            notifier.success(
                "Appointment selected",
                &format!("{} at {}", date, slot.label),
            );
        }
        None => notifier.error("Fully booked", &format!("No open slots on {}", date)),
    }

    Ok(())
}
