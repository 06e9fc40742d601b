use lopdf::{Dictionary, Document, Object, Stream};
use pdf_jobs::*;
use std::path::Path;
use tempfile::TempDir;

fn pdf_bytes(sizes: &[(i64, i64)]) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for (width, height) in sizes {
        let content_id = doc.add_object(Stream::new(Dictionary::new(), b"q Q".to_vec()));
        let page_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(*width),
                    Object::Integer(*height),
                ]),
            ),
            ("Resources", Object::Dictionary(Dictionary::new())),
            ("Contents", Object::Reference(content_id)),
        ]));
        kids.push(Object::Reference(page_id));
    }

    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(kids.len() as i64)),
        ("Kids", Object::Array(kids)),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));
    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut writer = Vec::new();
    doc.save_to(&mut writer).unwrap();
    writer
}

fn letter(count: usize) -> Vec<u8> {
    pdf_bytes(&vec![(612, 792); count])
}

async fn runner(dir: &TempDir) -> JobRunner {
    let config = WorkspaceConfig {
        staging_dir: dir.path().join("uploads"),
        output_dir: dir.path().join("output"),
        ..WorkspaceConfig::default()
    };
    let lifecycle = LifecycleManager::new(config);
    lifecycle.prepare().await.unwrap();
    JobRunner::new(lifecycle)
}

fn entries(path: &Path) -> usize {
    std::fs::read_dir(path).map(|e| e.count()).unwrap_or(0)
}

async fn page_count_of(runner: &JobRunner, reference: &str) -> usize {
    let download = runner.download(reference).await.unwrap();
    Document::load_mem(&download.bytes).unwrap().get_pages().len()
}

#[tokio::test]
async fn test_merge_produces_one_artifact() {
    let dir = TempDir::new().unwrap();
    let runner = runner(&dir).await;

    let outcome = runner
        .run(JobRequest::Merge {
            files: vec![
                Upload::new("a.pdf", pdf_bytes(&[(612, 792), (842, 595)])),
                Upload::new("b.pdf", letter(3)),
            ],
        })
        .await
        .unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.message, "Successfully merged 2 files into 5 pages");
    assert_eq!(outcome.artifacts.len(), 1);
    let artifact = &outcome.artifacts[0];
    assert_eq!(artifact.file_name, "merged.pdf");
    assert!(artifact.download_url.ends_with(&artifact.reference));

    // uploads are gone as soon as the job returns
    assert_eq!(entries(&dir.path().join("uploads")), 0);
    assert_eq!(page_count_of(&runner, &artifact.reference).await, 5);
}

#[tokio::test]
async fn test_split_by_ranges() {
    let dir = TempDir::new().unwrap();
    let runner = runner(&dir).await;

    let outcome = runner
        .run(JobRequest::Split {
            file: Upload::new("five.pdf", letter(5)),
            action: SplitAction::ByRange {
                ranges: vec![PageRange::new(1, 2), PageRange::new(4, 4)],
            },
        })
        .await
        .unwrap();

    let names: Vec<&str> = outcome.artifacts.iter().map(|a| a.file_name.as_str()).collect();
    assert_eq!(names, ["pages_1_to_2.pdf", "pages_4_to_4.pdf"]);
    assert_eq!(page_count_of(&runner, &outcome.artifacts[0].reference).await, 2);
    assert_eq!(page_count_of(&runner, &outcome.artifacts[1].reference).await, 1);
}

#[tokio::test]
async fn test_split_by_out_of_bounds_range_yields_nothing() {
    let dir = TempDir::new().unwrap();
    let runner = runner(&dir).await;

    let outcome = runner
        .run(JobRequest::Split {
            file: Upload::new("five.pdf", letter(5)),
            action: SplitAction::ByRange {
                ranges: vec![PageRange::new(10, 20)],
            },
        })
        .await
        .unwrap();

    assert!(outcome.success);
    assert!(outcome.artifacts.is_empty());
    assert_eq!(entries(&dir.path().join("output")), 0);
}

#[tokio::test]
async fn test_split_by_pages_message() {
    let dir = TempDir::new().unwrap();
    let runner = runner(&dir).await;

    let outcome = runner
        .run(JobRequest::Split {
            file: Upload::new("seven.pdf", letter(7)),
            action: SplitAction::ByPages { pages_per_file: 3 },
        })
        .await
        .unwrap();

    assert_eq!(outcome.message, "Successfully split 7 pages into 3 files");
    assert_eq!(outcome.artifacts[2].file_name, "page_7_to_7.pdf");
}

#[tokio::test]
async fn test_number_and_compress_keep_page_count() {
    let dir = TempDir::new().unwrap();
    let runner = runner(&dir).await;

    let numbered = runner
        .run(JobRequest::Number {
            file: Upload::new("report.pdf", letter(4)),
        })
        .await
        .unwrap();
    assert_eq!(numbered.artifacts[0].file_name, "numbered_report.pdf");
    assert_eq!(page_count_of(&runner, &numbered.artifacts[0].reference).await, 4);

    let compressed = runner
        .run(JobRequest::Compress {
            file: Upload::new("report.pdf", letter(2)),
            level: CompressionLevel::High,
        })
        .await
        .unwrap();
    assert_eq!(compressed.artifacts[0].file_name, "compressed_report.pdf");
    assert_eq!(page_count_of(&runner, &compressed.artifacts[0].reference).await, 2);
}

#[tokio::test]
async fn test_short_password_fails_before_any_file_io() {
    let dir = TempDir::new().unwrap();
    let runner = runner(&dir).await;

    let err = runner
        .run(JobRequest::Protect {
            file: Upload::new("a.pdf", letter(1)),
            password: Password::from("12345"),
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.status_code(), 400);
    assert_eq!(entries(&dir.path().join("uploads")), 0);
    assert_eq!(entries(&dir.path().join("output")), 0);
}

#[tokio::test]
async fn test_protect_produces_encrypted_artifact() {
    let dir = TempDir::new().unwrap();
    let runner = runner(&dir).await;

    let outcome = runner
        .run(JobRequest::Protect {
            file: Upload::new("a.pdf", letter(1)),
            password: Password::from("correct horse"),
        })
        .await
        .unwrap();
    assert_eq!(outcome.message, "PDF protected successfully");

    let download = runner.download(&outcome.artifacts[0].reference).await.unwrap();
    assert!(download.bytes.windows(8).any(|w| w == b"/Encrypt"));
}

#[tokio::test]
async fn test_non_pdf_upload_leaves_nothing_behind() {
    let dir = TempDir::new().unwrap();
    let runner = runner(&dir).await;

    let err = runner
        .run(JobRequest::Merge {
            files: vec![
                Upload::new("good.pdf", letter(1)),
                Upload::new("bad.pdf", b"this is not a pdf".to_vec()),
            ],
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(entries(&dir.path().join("uploads")), 0);
    assert_eq!(entries(&dir.path().join("output")), 0);
}

#[tokio::test]
async fn test_zero_page_pdf_is_unreadable() {
    let dir = TempDir::new().unwrap();
    let runner = runner(&dir).await;

    let err = runner
        .run(JobRequest::Number {
            file: Upload::new("empty.pdf", pdf_bytes(&[])),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unreadable);
    assert_eq!(err.status_code(), 400);
    assert_eq!(entries(&dir.path().join("uploads")), 0);
    assert_eq!(entries(&dir.path().join("output")), 0);
}

#[tokio::test]
async fn test_corrupt_pdf_gets_unlock_message() {
    let dir = TempDir::new().unwrap();
    let runner = runner(&dir).await;

    let err = runner
        .run(JobRequest::Number {
            file: Upload::new("broken.pdf", b"%PDF-1.7\ngarbage without structure".to_vec()),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unreadable);
    assert!(
        err.user_message() == UNREADABLE_PDF_MESSAGE
            || err.user_message() == "The PDF file is empty or corrupted"
    );
    assert_eq!(entries(&dir.path().join("uploads")), 0);
}

#[tokio::test]
async fn test_images_to_pdf() {
    let dir = TempDir::new().unwrap();
    let runner = runner(&dir).await;

    let mut png = Vec::new();
    image::DynamicImage::ImageRgb8(image::RgbImage::new(20, 10))
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();

    let outcome = runner
        .run(JobRequest::ImagesToPdf {
            images: vec![
                Upload::new("one.png", png.clone()),
                Upload::new("two.PNG", png),
            ],
        })
        .await
        .unwrap();
    assert_eq!(outcome.message, "Successfully converted 2 images to PDF");
    assert_eq!(outcome.artifacts[0].file_name, "converted_images.pdf");
    assert_eq!(entries(&dir.path().join("uploads")), 0);
    assert_eq!(page_count_of(&runner, &outcome.artifacts[0].reference).await, 2);
}

#[tokio::test]
async fn test_second_download_is_not_found() {
    let dir = TempDir::new().unwrap();
    let runner = runner(&dir).await;

    let outcome = runner
        .run(JobRequest::Number {
            file: Upload::new("a.pdf", letter(1)),
        })
        .await
        .unwrap();
    let reference = &outcome.artifacts[0].reference;

    assert!(runner.download(reference).await.is_ok());
    let err = runner.download(reference).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.status_code(), 404);
    assert_eq!(JobOutcome::failed(&err).message, "File not found");
}

#[tokio::test]
async fn test_image_format_comes_from_contents() {
    let dir = TempDir::new().unwrap();
    let runner = runner(&dir).await;

    let mut png = Vec::new();
    image::DynamicImage::ImageRgb8(image::RgbImage::new(30, 12))
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();

    let outcome = runner
        .run(JobRequest::ImagesToPdf {
            images: vec![Upload::new("photo.jpg", png)],
        })
        .await
        .unwrap();
    assert_eq!(page_count_of(&runner, &outcome.artifacts[0].reference).await, 1);
}
