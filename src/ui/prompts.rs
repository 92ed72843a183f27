//! Interactive prompts
//!
//! Everything asked here can also arrive via CLI flags; by the time the core
//! runs, choices are plain configuration.

use crate::error::{Result, YtBatchError};
use crate::storage::manifest::ManifestKind;
use crate::types::DownloadKind;
use dialoguer::{Input, Select};

const QUALITY_CHOICES: [u32; 5] = [1080, 720, 480, 360, 240];

fn map_dialoguer(e: dialoguer::Error) -> YtBatchError {
    match e {
        dialoguer::Error::IO(io) => YtBatchError::File(io),
    }
}

/// Ask which manifest format the file uses
pub fn prompt_manifest_kind() -> Result<ManifestKind> {
    let selection = Select::new()
        .with_prompt("Select playlist file type")
        .items(&["JSON (with custom folders)", "Text (numbered folders)"])
        .default(0)
        .interact()
        .map_err(map_dialoguer)?;

    Ok(if selection == 0 {
        ManifestKind::Json
    } else {
        ManifestKind::Text
    })
}

/// Ask for the manifest file path
pub fn prompt_manifest_path(kind: ManifestKind) -> Result<String> {
    let default = match kind {
        ManifestKind::Json => "playlists.json",
        ManifestKind::Text => "playlists.txt",
    };

    Input::new()
        .with_prompt("Enter the path to your playlist file")
        .default(default.to_string())
        .interact_text()
        .map_err(map_dialoguer)
}

/// Ask for the maximum acceptable video quality
pub fn prompt_quality() -> Result<u32> {
    let labels: Vec<String> = QUALITY_CHOICES.iter().map(|q| format!("{q}p")).collect();
    let selection = Select::new()
        .with_prompt("Select maximum video quality")
        .items(&labels)
        .default(0)
        .interact()
        .map_err(map_dialoguer)?;

    Ok(QUALITY_CHOICES[selection])
}

/// Ask what streams to download
pub fn prompt_kind() -> Result<DownloadKind> {
    let selection = Select::new()
        .with_prompt("What would you like to download?")
        .items(&["Video with Audio", "Video Only", "Audio Only"])
        .default(0)
        .interact()
        .map_err(map_dialoguer)?;

    Ok(match selection {
        1 => DownloadKind::VideoOnly,
        2 => DownloadKind::AudioOnly,
        _ => DownloadKind::Both,
    })
}
