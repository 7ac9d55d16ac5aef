fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() != Ok("windows") {
        return;
    }

    // Common controls v6 for themed message boxes, per-monitor DPI awareness.
    embed_manifest::embed_manifest(
        embed_manifest::new_manifest("cvmd2html.launcher")
            .dpi_awareness(embed_manifest::manifest::DpiAwareness::PerMonitorV2),
    )
    .expect("unable to embed manifest");

    let mut res = winres::WindowsResource::new();
    res.set("FileDescription", "Markdown to HTML shortcut launcher")
        .set("ProductName", "cvmd2html")
        .set("OriginalFilename", "cvmd2html.exe");
    if let Err(e) = res.compile() {
        println!("cargo:warning=version resource not embedded: {e}");
    }
}
