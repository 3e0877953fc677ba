use std::path::Path;

use anyhow::Context as _;
use fs_extra::dir::CopyOptions;
use log::{debug, info};

use crate::{
    aggregate::{self, TagIndex},
    context::Context,
    post,
    renderer::PageRenderer,
};

mod feed;
mod search;
mod sitemap;

const ASSETS_DIR: &str = "assets";

fn write_file(path: &Path, contents: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("while creating directory {parent:?}"))?;
    }
    debug!("Writing {path:?}");
    std::fs::write(path, contents).with_context(|| format!("while writing {path:?}"))
}

fn copy_assets(assets_dir: &Path, out_dir: &Path) -> anyhow::Result<()> {
    if !assets_dir.is_dir() {
        info!("No assets directory at {assets_dir:?}, skipping copy");
        return Ok(());
    }
    let mut cp_opts = CopyOptions::new();
    cp_opts.copy_inside = true;
    cp_opts.content_only = true;
    cp_opts.overwrite = true;
    fs_extra::dir::copy(assets_dir, out_dir.join(ASSETS_DIR), &cp_opts)
        .with_context(|| format!("while copying assets from {assets_dir:?}"))?;
    Ok(())
}

/// Runs one full build: clears the output directory, loads every post and
/// writes all pages, the feed, the sitemap, the assets and the search index.
pub(crate) fn generate(ctx: &Context) -> anyhow::Result<()> {
    let config = &ctx.config;
    let out_dir = &config.output;

    fs_extra::dir::remove(out_dir).with_context(|| format!("while cleaning {out_dir:?}"))?;
    fs_extra::dir::create_all(out_dir, false)
        .with_context(|| format!("while creating {out_dir:?}"))?;

    // Aggregation needs every post, so loading finishes before anything is rendered.
    let posts = post::load_posts(&config.posts.directory, config.posts.excerpt_length)?;
    let archives = aggregate::archives(&posts);
    let tags = TagIndex::build(&posts);
    let renderer = PageRenderer::new(config, &ctx.templates, &posts, &tags);

    write_file(&out_dir.join("index.html"), &renderer.index())?;
    for (i, post) in posts.iter().enumerate() {
        let path = out_dir.join("posts").join(&post.slug).join("index.html");
        write_file(&path, &renderer.post(i))
            .with_context(|| format!("while generating page for {:?}", post.path))?;
    }
    write_file(
        &out_dir.join("archives").join("index.html"),
        &renderer.archives(&archives),
    )?;
    write_file(&out_dir.join("tags").join("index.html"), &renderer.tags())?;
    for entry in tags.entries() {
        let path = out_dir.join("tags").join(&entry.slug).join("index.html");
        write_file(&path, &renderer.tag(entry))?;
    }

    let feed = feed::build(config, &posts);
    write_file(&out_dir.join("atom.xml"), &feed.to_string())?;
    write_file(
        &out_dir.join("sitemap.xml"),
        &sitemap::build(&config.site.url, &posts, &tags),
    )?;

    copy_assets(&config.assets, out_dir)?;
    let index = search::build(&posts).context("while building the search index")?;
    write_file(&out_dir.join(ASSETS_DIR).join("search-index.json"), &index)?;

    info!(
        "Generated {} posts, {} archive months and {} tags into {out_dir:?}",
        posts.len(),
        archives.len(),
        tags.len()
    );
    Ok(())
}
