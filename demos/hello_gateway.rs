use vfs_gate::{
    Dispatch, DocumentStore, FileEntry, FolderDocument, GateConfig, Gateway, MapStore, codec,
    logging,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    logging::init_logging("debug")?;

    // one namespace document, as a JSON database would store it
    let document = FolderDocument {
        files: vec![
            FileEntry {
                name: "index.html".into(),
                path: "MyGame/start/index.html".into(),
                media_type: Some("text/html".into()),
                data: codec::encode(br#"<script src="Build/MyGame.loader.js"></script>"#),
            },
            FileEntry {
                name: "MyGame.wasm".into(),
                path: "MyGame/Build/MyGame.wasm".into(),
                media_type: None,
                data: codec::encode(b"\0asm\x01\0\0\0"),
            },
        ],
    };
    let mut database = MapStore::new();
    database.put(
        "https://db.example",
        "files",
        "item_12345.json",
        serde_json::to_string(&document)?,
    );

    // the namespace stays unconfigured until the control message arrives
    let gateway = Gateway::new(GateConfig::default(), DocumentStore::new(database));
    gateway
        .namespace()
        .apply_json(r#"{"type":"INIT_FIREBASE","dbUrl":"https://db.example"}"#)?;

    for path in [
        "/virtual/item_12345/",
        "/virtual/item_12345/Build/MyGame.wasm",
        "/virtual/item_12345/Build/missing.data",
        "/virtual/",
        "/styles.css",
    ] {
        match gateway.dispatch(path).await {
            Dispatch::PassThrough => println!("{path} -> pass through"),
            Dispatch::Respond(response) => println!(
                "{path} -> {} {:?} ({} bytes)",
                response.status.code(),
                response.header("Content-Type"),
                response.body.len()
            ),
        }
    }

    Ok(())
}
