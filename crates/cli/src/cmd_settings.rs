//! `playground settings`: show or edit the persisted assistant settings.

use playground_client::{PersistedSettings, SettingsField};

use crate::render;

pub fn show(settings: &PersistedSettings) -> anyhow::Result<()> {
    println!();
    render::print_settings(&settings.get());
    println!();
    Ok(())
}

pub async fn set(
    settings: &PersistedSettings,
    field: SettingsField,
    value: String,
) -> anyhow::Result<()> {
    let updated = settings.get().with_field(field, value);
    settings.set(updated).await?;
    println!("  {field} updated");
    Ok(())
}

pub async fn sample(settings: &PersistedSettings) -> anyhow::Result<()> {
    settings.set(playground_client::Settings::sample()).await?;
    println!("  Sample settings loaded");
    show(settings)
}
