use tweetle::{trace_init, App, Settings};

#[tokio::main]
async fn main() -> tweetle::Arrive<()> {
    trace_init();
    let settings = Settings::load()?;
    let mut app = App::new(settings)?;
    tracing::info!("Type `help` for commands.");
    app.run().await?;
    Ok(())
}
