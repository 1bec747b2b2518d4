//! `playground status`: one status read against the server, printed.

use playground_client::Orchestrator;

use crate::render;

pub async fn run(orchestrator: &Orchestrator, base_url: &str) -> anyhow::Result<()> {
    println!();
    println!("  Server: {base_url}");
    println!("  User: {}", orchestrator.settings().user);

    if let Err(e) = orchestrator.sync_status().await {
        // No assistant is an empty result set, which is the common case.
        println!("  Status read failed: {e}");
    }

    let view = orchestrator.status_view();
    render::print_status(&view);
    render::print_files(&view.files);
    println!();
    Ok(())
}
