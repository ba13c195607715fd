use super::convert::render;
use super::ui;
use crate::core::currency::RateProvider;
use crate::core::session::ConverterSession;
use anyhow::Result;

/// Fetches rates now, regardless of how fresh the cached ones are.
pub async fn run(session: &mut ConverterSession, provider: &dyn RateProvider) -> Result<()> {
    if !session.state().online {
        println!(
            "{}",
            ui::style_text("Offline, showing cached rates", ui::StyleType::Subtle)
        );
    } else {
        let spinner = ui::new_spinner("Fetching exchange rates...");
        session.refresh(provider).await;
        spinner.finish_and_clear();
    }

    println!("{}", render(session.state()));
    Ok(())
}
