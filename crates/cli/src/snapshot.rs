use colored::Colorize;
use mangrove_sdk::state::EventPool;

pub(crate) fn render(pool: &EventPool) {
    println!(
        "{}\n",
        format!("{:#^144}", format!(" Mangrove Book {} ", pool.market()))
            .bold()
            .purple()
    );
    if let Some(state) = pool.latest_state() {
        println!("{}", state);
    }
}
