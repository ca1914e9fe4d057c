pub mod doctor;
pub mod import;
pub mod pharmacies;
pub mod predict;
pub mod remind;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tokio::io::AsyncWriteExt;

use crate::config::MatcherConfig;
use crate::embedding::local::model_dir;

const HF_BASE: &str = "https://huggingface.co/sentence-transformers";

/// Download the sentence encoder and its tokenizer for medicine search.
pub async fn model_download(config: &MatcherConfig) -> Result<()> {
    let dir = model_dir(config);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create model dir: {}", dir.display()))?;

    let files = [
        ("model.onnx", format!("{HF_BASE}/{}/resolve/main/onnx/model.onnx", config.model)),
        ("tokenizer.json", format!("{HF_BASE}/{}/resolve/main/tokenizer.json", config.model)),
    ];

    for (name, url) in &files {
        let dest = dir.join(name);
        if dest.exists() {
            println!("{name} already exists at {}", dest.display());
            continue;
        }
        println!("Downloading {name}...");
        download_file(url, &dest).await?;
        println!("Saved to {}", dest.display());
    }

    println!("Model download complete. Medicine search is ready.");
    Ok(())
}

/// Download a file with a progress bar. Writes to a temp file, then renames.
async fn download_file(url: &str, dest: &Path) -> Result<()> {
    let mut response = reqwest::get(url)
        .await
        .with_context(|| format!("HTTP request failed for {url}"))?;

    anyhow::ensure!(
        response.status().is_success(),
        "download failed with HTTP {}",
        response.status()
    );

    let pb = match response.content_length() {
        Some(size) => {
            let pb = ProgressBar::new(size);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("  {bar:40.cyan/blue} {bytes}/{total_bytes} ({eta})")
                    .expect("valid template")
                    .progress_chars("##-"),
            );
            pb
        }
        None => ProgressBar::new_spinner(),
    };

    let tmp_path = dest.with_extension("tmp");
    let mut file = tokio::fs::File::create(&tmp_path)
        .await
        .with_context(|| format!("failed to create temp file: {}", tmp_path.display()))?;

    while let Some(chunk) = response.chunk().await.context("error reading response")? {
        file.write_all(&chunk).await.context("error writing to file")?;
        pb.inc(chunk.len() as u64);
    }

    file.flush().await?;
    drop(file);

    tokio::fs::rename(&tmp_path, dest)
        .await
        .context("failed to rename temp file")?;

    pb.finish_and_clear();
    Ok(())
}
