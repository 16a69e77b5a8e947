/*!
 * End-to-end tests for the merge and annotate workflows
 */

use anyhow::Result;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use wheresthejump::app_config::Config;
use wheresthejump::app_controller::{Controller, MergeReport};
use wheresthejump::errors::AppError;
use wheresthejump::subtitle_processor::SubtitleCollection;
use crate::common;

/// Two files on disk merge into a third, overlapping cues combined
#[test]
fn test_merge_files_withOverlappingTracks_shouldWriteMergedFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let local = common::create_test_file(temp_dir.path(), "srt/Alien.srt", common::local_track_srt())?;
    let downloaded = common::create_test_file(temp_dir.path(), "dl/tt0078748.srt", common::downloaded_track_srt())?;
    let output = temp_dir.path().join("srt/Alien_merged.srt");

    let controller = Controller::new_for_test()?;
    let report = controller.merge_files(&local, &downloaded, &output)?;

    assert_eq!(report, MergeReport { local_cues: 2, downloaded_cues: 3, merged_cues: 4 });

    let merged = SubtitleCollection::from_srt_file(&output)?;
    let texts: Vec<&str> = merged.entries.iter().map(|e| e.text.as_str()).collect();
    assert_eq!(texts, vec![
        "Did you hear that?",
        "Upcoming jump scare (Minor)\n\nAaah!",
        "It's gone.",
        "Upcoming jump scare (Major)",
    ]);
    assert_eq!(merged.entries[1].start_time_ms, 5_000);
    assert_eq!(merged.entries[1].end_time_ms, 10_000);

    Ok(())
}

/// A smaller tolerance from the config changes what counts as overlapping
#[test]
fn test_merge_files_withZeroTolerance_shouldOnlyMergeTrueOverlaps() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let local = common::create_test_file(
        temp_dir.path(),
        "local.srt",
        "1\n00:00:10,000 --> 00:00:12,000\nJump scare (Minor)\n",
    )?;
    let downloaded = common::create_test_file(
        temp_dir.path(),
        "downloaded.srt",
        "1\n00:00:12,400 --> 00:00:13,000\nToo late\n",
    )?;
    let output = temp_dir.path().join("out.srt");

    let mut config = Config::default();
    config.merge.tolerance_ms = 0;
    let report = Controller::with_config(config)?.merge_files(&local, &downloaded, &output)?;

    assert_eq!(report.merged_cues, 2);
    Ok(())
}

/// A downloaded file without cues fails the merge and leaves no output behind
#[test]
fn test_merge_files_withEmptyDownload_shouldFailWithoutOutput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let local = common::create_test_file(temp_dir.path(), "local.srt", common::local_track_srt())?;
    let downloaded = common::create_test_file(temp_dir.path(), "downloaded.srt", "\n\n")?;
    let output = temp_dir.path().join("out.srt");

    let controller = Controller::new_for_test()?;

    assert!(controller.merge_files(&local, &downloaded, &output).is_err());
    assert!(!output.exists());
    Ok(())
}

/// A saved movie page becomes a jump-scare track
#[tokio::test]
async fn test_annotate_withPageFile_shouldWriteAnnotationTrack() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let page = common::create_test_file(temp_dir.path(), "alien.html", common::movie_page_html())?;
    let output = temp_dir.path().join("srt/Alien.srt");

    let controller = Controller::new_for_test()?;
    let count = controller.annotate(&page.to_string_lossy(), &output).await?;

    assert_eq!(count, 3);
    let track = SubtitleCollection::from_srt_file(&output)?;
    assert_eq!(track.entries[0].start_time_ms, 7_000);
    assert_eq!(track.entries[0].end_time_ms, 12_000);
    assert_eq!(track.entries[1].text, "Upcoming jump scare (Major)");
    assert_eq!(track.entries[2].start_time_ms, 0);

    Ok(())
}

/// Pages can be fetched over http
#[tokio::test]
async fn test_annotate_withPageUrl_shouldFetchAndWrite() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/movies/alien-1979"))
        .respond_with(ResponseTemplate::new(200).set_body_string(common::movie_page_html()))
        .mount(&server)
        .await;
    let temp_dir = common::create_temp_dir()?;
    let output = temp_dir.path().join("Alien.srt");

    let controller = Controller::new_for_test()?;
    let count = controller.annotate(&format!("{}/movies/alien-1979", server.uri()), &output).await?;

    assert_eq!(count, 3);
    assert!(output.exists());
    Ok(())
}

/// A page without timestamps is an error and writes nothing
#[test]
fn test_annotate_withNoTimestamps_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let page = common::create_test_file(temp_dir.path(), "calm.html", "<p>No scares in this one.</p>")?;
    let output = temp_dir.path().join("calm.srt");

    let controller = Controller::new_for_test()?;
    let result = tokio_test::block_on(controller.annotate(&page.to_string_lossy(), &output));

    assert!(result.is_err());
    assert!(!output.exists());
    Ok(())
}

/// Invalid configuration is refused up front
#[test]
fn test_with_config_withInvalidConfig_shouldReturnConfigError() {
    let mut config = Config::default();
    config.annotations.lead_in_ms = 0;

    let error = match Controller::with_config(config) {
        Ok(_) => panic!("invalid config accepted"),
        Err(e) => e,
    };

    assert!(matches!(error.downcast_ref::<AppError>(), Some(AppError::Config(_))));
}
