//! Discovery benchmarks using Criterion

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use modsmith_core::{find_references, locate, ComponentName, ComponentType, ProjectContext};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const CONFIG: &str = "mod:\n  id: benchmod\n  name: Bench Mod\n  version: 1.0.0\nminecraft_versions: [1.20.1]\nloaders: [fabric, forge]\n";

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// A project with `count` items, each with a class, a model and a registry line
fn synthetic_project(count: usize) -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "config.yml", CONFIG);

    let mut registry = String::from("package com.benchmod.registry;\n\n");
    for i in 0..count {
        let class = format!("Item{}", i);
        write(
            root,
            &format!("shared/common/src/main/java/com/benchmod/items/{}.java", class),
            &format!("package com.benchmod.items;\n\npublic class {} extends Item {{}}\n", class),
        );
        write(
            root,
            &format!("versions/shared/v1/assets/benchmod/models/item/item{}.json", i),
            &format!("{{\"parent\": \"minecraft:item/generated\", \"textures\": {{\"layer0\": \"benchmod:item/item{}\"}}}}", i),
        );
        registry.push_str(&format!("register(\"item{}\", {}::new);\n", i, class));
    }
    write(root, "shared/common/src/main/java/com/benchmod/registry/ModItems.java", &registry);
    dir
}

fn discovery_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("discovery");
    let project = synthetic_project(500);
    let ctx = ProjectContext::load(project.path()).unwrap();
    let name = ComponentName::parse("item250").unwrap();

    group.bench_function("locate_500_items", |b| {
        b.iter(|| black_box(locate(&ctx, &name, ComponentType::Item)))
    });

    let owned = locate(&ctx, &name, ComponentType::Item);
    group.bench_function("scan_references_500_items", |b| {
        b.iter(|| black_box(find_references(&ctx, &name, ComponentType::Item, &owned)))
    });

    group.finish();
}

criterion_group!(benches, discovery_benchmarks);
criterion_main!(benches);
