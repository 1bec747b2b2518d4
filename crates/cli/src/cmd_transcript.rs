//! `playground transcript show`: print the persisted conversation.

use playground_client::TranscriptStore;

use crate::render;

pub fn show(transcript: &TranscriptStore) -> anyhow::Result<()> {
    render::print_transcript(transcript.all());
    println!();
    Ok(())
}
