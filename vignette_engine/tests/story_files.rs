use std::fs;

use vignette_engine::*;

const LIGHTHOUSE: &str = r##"
[story]
title = "The Lighthouse"
author = "Anonymous"
start = "shore"
seed = 17

[[situations]]
name = "shore"
content = """
    The lighthouse stands on the point.

    A [gull](./_writer_gull) circles overhead.
"""
choices = ["#climb", "village"]
classes = ["outdoors"]

[situations.writers]
gull = ["It cries once,", "then drifts away."]

[[situations]]
name = "stairs"
content = "You climb the *stairs*."
tags = ["climb"]
option_text = "Climb the stairs"
priority = 2

[[situations]]
name = "village"
content = "The village is quiet."
option_text = "Walk to the village"
"##;

fn write_story(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, body).expect("write story file");
    path
}

#[test]
fn toml_story_plays_through() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_story(&dir, "lighthouse.toml", LIGHTHOUSE);

    let mut story = load_story(&path, ()).expect("load");
    story.begin().expect("begin");

    let html = story.view().html();
    assert!(html.contains("class=\"situation-shore outdoors\""));
    assert!(html.contains("<li><a href=\"stairs\">Climb the stairs</a></li><li><a href=\"village\">"));

    story.click("./_writer_gull").expect("gull");
    assert!(story.view().text().contains("It cries once,\nthen drifts away."));

    story.click("stairs").expect("stairs");
    assert_eq!(story.current(), Some("stairs"));
    assert!(story.view().html().contains("You climb the <em>stairs</em>."));
}

#[test]
fn story_meta_becomes_config() {
    let def = loader::parse_story_toml(LIGHTHOUSE).expect("parse");
    let config = StoryConfig::from_meta(&def.story);
    assert_eq!(config.start, "shore");
    assert_eq!(config.seed, Some(17));
    assert_eq!(def.story.author, "Anonymous");
}

#[test]
fn broken_references_fail_to_load() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_story(
        &dir,
        "broken.toml",
        r##"
[story]
title = "Broken"

[[situations]]
name = "start"
choices = ["nowhere"]
"##,
    );
    let err = load_story(&path, ()).err().expect("missing choice target");
    let chain = format!("{err:#}");
    assert!(chain.contains("story validation failed"));
    assert!(chain.contains("nowhere"));
}

#[test]
fn unknown_fields_are_rejected() {
    let err = loader::parse_story_toml(
        r##"
[story]
title = "Typo"

[[situations]]
name = "start"
contnet = "oops"
"##,
    )
    .expect_err("typo in field name");
    assert!(format!("{err:#}").contains("contnet"));
}

#[test]
fn custom_behaviour_can_be_added_to_loaded_stories() {
    let def = loader::parse_story_toml(LIGHTHOUSE).expect("parse");
    let mut registry: SituationRegistry<u32> = build_registry(&def).expect("registry");
    registry
        .define(
            "keeper",
            SituationSpec::<u32>::new().content_fn(|_, count, _, _| {
                *count += 1;
                format!("The keeper has seen you {count} time(s).")
            }),
        )
        .expect("keeper");
    let mut story = Story::new(registry, 0, StoryConfig::from_meta(&def.story)).expect("story");
    story.begin().expect("begin");
    story.go_to("keeper").expect("keeper");
    assert_eq!(*story.character(), 1);
    assert!(story.view().text().contains("The keeper has seen you 1 time(s)."));
}

#[test]
fn loaded_situations_can_be_given_actions_and_replaced() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_story(&dir, "lighthouse.toml", LIGHTHOUSE);

    let mut story = load_story_with(&path, 0u32, |name, spec| {
        if name == "stairs" {
            spec.after(|_, climbs, system, _| {
                *climbs += 1;
                system.write("<p>Your legs ache.</p>");
                Ok(())
            })
        } else {
            spec
        }
    })
    .expect("load");
    story.begin().expect("begin");
    story.click("stairs").expect("stairs");
    assert_eq!(*story.character(), 1);
    assert!(story.view().html().ends_with("<p>Your legs ache.</p>"));

    let def = loader::parse_story_toml(LIGHTHOUSE).expect("parse");
    let mut registry: SituationRegistry<u32> = build_registry(&def).expect("registry");
    let old = registry
        .replace("village", SituationSpec::new().content("The village is gone.").option_text("Look for the village"))
        .expect("replace village");
    assert_eq!(old.label(), "Walk to the village");
    let mut story = Story::new(registry, 0, StoryConfig::from_meta(&def.story)).expect("story");
    story.begin().expect("begin");
    assert!(story.view().html().contains("<a href=\"village\">Look for the village</a>"));
    story.click("village").expect("village");
    assert!(story.view().text().contains("The village is gone."));
}

#[test]
fn option_text_can_span_lines() {
    let def = loader::parse_story_toml(
        r##"
[story]
title = "Lines"

[[situations]]
name = "start"
choices = ["end"]

[[situations]]
name = "end"
option_text = ["Leave", "quietly"]
"##,
    )
    .expect("parse");
    let registry: SituationRegistry<()> = build_registry(&def).expect("registry");
    assert_eq!(registry.get("end").map(Situation::label), Some("Leave\nquietly"));
}
