// Common test utilities
#![allow(dead_code)]

use nappa_instrument::config::InstrumentConfig;
use nappa_instrument::corpus::{Corpus, SourceFile};
use nappa_instrument::dialect::DialectKind;
use nappa_instrument::discovery::ActivityMap;
use nappa_instrument::instrument::Instrumenter;
use nappa_instrument::report::ResultCollector;
use nappa_instrument::types::InstrumentationResult;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

pub const JAVA_OBSERVER: &str = "getLifecycle().addObserver(new NappaLifecycleObserver(this));";
pub const JAVA_INIT: &str =
    "Nappa.init(this, PrefetchingStrategyType.STRATEGY_GREEDY_VISIT_FREQUENCY);";
pub const KOTLIN_OBSERVER: &str = "lifecycle.addObserver(NappaLifecycleObserver(this))";
pub const JAVA_IMPORT: &str = "import nl.vu.cs.s2group.nappa.*;";
pub const KOTLIN_IMPORT: &str = "import nl.vu.cs.s2group.nappa.*";

fn file_name(name: &str, dialect: DialectKind) -> String {
    match dialect {
        DialectKind::Java => format!("{name}.java"),
        DialectKind::Kotlin => format!("{name}.kt"),
    }
}

/// Run the activity pass on one in-memory source declared as component `name`.
pub fn instrument_activity(
    source: &str,
    dialect: DialectKind,
    name: &str,
    launcher: bool,
) -> (String, InstrumentationResult) {
    let instrumenter = Instrumenter::new(InstrumentConfig::default());
    let mut corpus = Corpus::new(
        vec![SourceFile::new(file_name(name, dialect), dialect, source)],
        Vec::new(),
    );
    let mut activities = ActivityMap::new();
    activities.insert(name.to_string(), launcher);
    let mut collector = ResultCollector::new(true);
    instrumenter.instrument_activities(&mut corpus, &activities, &mut collector);
    (corpus.files()[0].text().to_string(), collector.finish())
}

/// Run the intent-extras pass on one in-memory source.
pub fn instrument_extras(source: &str, dialect: DialectKind) -> (String, InstrumentationResult) {
    let instrumenter = Instrumenter::new(InstrumentConfig::default());
    let mut corpus = Corpus::new(
        vec![SourceFile::new(file_name("Screen", dialect), dialect, source)],
        Vec::new(),
    );
    let mut collector = ResultCollector::new(true);
    instrumenter.instrument_intent_extras(&mut corpus, &mut collector);
    (corpus.files()[0].text().to_string(), collector.finish())
}

pub const MANIFEST: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<manifest xmlns:android="http://schemas.android.com/apk/res/android"
    package="com.example.app">

    <application android:label="@string/app_name">
        <activity android:name=".MainActivity">
            <intent-filter>
                <action android:name="android.intent.action.MAIN" />
                <category android:name="android.intent.category.LAUNCHER" />
            </intent-filter>
        </activity>
        <activity android:name="com.example.app.DetailActivity" />
    </application>
</manifest>
"#;

pub const MAIN_ACTIVITY: &str = r#"package com.example.app;

import android.content.Intent;
import android.os.Bundle;

public class MainActivity extends AppCompatActivity {
    @Override
    protected void onCreate(Bundle savedInstanceState) {
        super.onCreate(savedInstanceState);
        setContentView(R.layout.activity_main);
    }

    void openDetail() {
        startActivity(new Intent(this, DetailActivity.class));
    }
}
"#;

pub const DETAIL_ACTIVITY: &str = r#"package com.example.app

import android.os.Bundle

class DetailActivity : AppCompatActivity() {
    override fun onCreate(savedInstanceState: Bundle?) {
        super.onCreate(savedInstanceState)
        setContentView(R.layout.activity_detail)
    }
}
"#;

/// A small Android project: a manifest, a Java launcher and a Kotlin activity.
pub fn setup_android_project() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let main = temp_dir.path().join("app").join("src").join("main");
    let sources = main.join("java").join("com").join("example").join("app");
    fs::create_dir_all(&sources).unwrap();

    fs::write(main.join("AndroidManifest.xml"), MANIFEST).unwrap();
    fs::write(sources.join("MainActivity.java"), MAIN_ACTIVITY).unwrap();
    fs::write(sources.join("DetailActivity.kt"), DETAIL_ACTIVITY).unwrap();

    // build output is never part of the corpus
    let generated = temp_dir.path().join("app").join("build").join("generated");
    fs::create_dir_all(&generated).unwrap();
    fs::write(generated.join("MainActivity.java"), MAIN_ACTIVITY).unwrap();

    temp_dir
}

pub fn project_config(root: &Path) -> InstrumentConfig {
    InstrumentConfig {
        root_directories: vec![root.to_path_buf()],
        ..InstrumentConfig::default()
    }
}

pub fn read_source(root: &Path, name: &str) -> String {
    fs::read_to_string(
        root.join("app")
            .join("src")
            .join("main")
            .join("java")
            .join("com")
            .join("example")
            .join("app")
            .join(name),
    )
    .unwrap()
}
