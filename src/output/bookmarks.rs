//! Bookmark snippet and listing page
//!
//! Every mirrored page gets a small script that adds a floating
//! "Bookmark this Page" button. The button and the listing page both talk to
//! the bookmark API of whatever server hosts the mirror:
//!
//! - `POST /api/add_bookmark` with `{ "title": ..., "url": ... }`
//! - `GET /api/bookmarks` returning `[{ "title": ..., "url": ... }]`

use std::path::{Path, PathBuf};

/// File name of the bookmark listing page at the output root
pub const BOOKMARKS_PAGE_FILE: &str = "_bookmarks.html";

/// Script appended to the body of every rewritten page
pub const BOOKMARK_SCRIPT: &str = r#"
document.addEventListener('DOMContentLoaded', () => {
    const bookmarkBtn = document.createElement('button');
    bookmarkBtn.textContent = 'Bookmark this Page';
    bookmarkBtn.style.position = 'fixed';
    bookmarkBtn.style.bottom = '10px';
    bookmarkBtn.style.right = '10px';
    bookmarkBtn.style.zIndex = '9999';
    bookmarkBtn.style.padding = '10px';
    bookmarkBtn.style.backgroundColor = '#007bff';
    bookmarkBtn.style.color = 'white';
    bookmarkBtn.style.border = 'none';
    bookmarkBtn.style.borderRadius = '5px';
    bookmarkBtn.style.cursor = 'pointer';
    document.body.appendChild(bookmarkBtn);

    bookmarkBtn.addEventListener('click', () => {
        fetch('/api/add_bookmark', {
            method: 'POST',
            headers: { 'Content-Type': 'application/json' },
            body: JSON.stringify({ title: document.title, url: window.location.pathname }),
        })
        .then(response => response.json())
        .then(data => {
            if (data.status === 'success') {
                alert('Bookmark added!');
            } else {
                alert('Error: ' + (data.error || 'Could not add bookmark.'));
            }
        })
        .catch(error => {
            console.error('Error adding bookmark:', error);
            alert('Failed to add bookmark.');
        });
    });
});
"#;

/// Static page listing saved bookmarks
pub const BOOKMARKS_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Bookmarks</title>
    <style>
        body { font-family: -apple-system, BlinkMacSystemFont, sans-serif; padding: 2em; color: #333; }
        h1 { color: #000; }
        ul { list-style-type: none; padding: 0; }
        li { margin-bottom: 1em; background-color: #f0f0f0; padding: 10px; border-radius: 5px; }
        a { text-decoration: none; color: #007bff; font-weight: bold; }
        a:hover { text-decoration: underline; }
    </style>
</head>
<body>
    <h1>My Bookmarks</h1>
    <ul id="bookmarks-list"></ul>
    <script>
        document.addEventListener('DOMContentLoaded', () => {
            const listElement = document.getElementById('bookmarks-list');
            fetch('/api/bookmarks')
                .then(response => response.json())
                .then(bookmarks => {
                    if (bookmarks && bookmarks.length > 0) {
                        bookmarks.forEach(bookmark => {
                            const listItem = document.createElement('li');
                            const link = document.createElement('a');
                            link.href = bookmark.url;
                            link.textContent = bookmark.title;
                            listItem.appendChild(link);
                            listElement.appendChild(listItem);
                        });
                    } else {
                        listElement.innerHTML = '<li>No bookmarks yet.</li>';
                    }
                })
                .catch(error => {
                    console.error('Error fetching bookmarks:', error);
                    listElement.innerHTML = '<li>Error loading bookmarks.</li>';
                });
        });
    </script>
</body>
</html>
"#;

/// Writes `_bookmarks.html` at the output root, replacing any previous copy
///
/// # Returns
///
/// * `Ok(PathBuf)` - Location of the written page
/// * `Err(std::io::Error)` - The directory or file could not be written
pub fn write_bookmarks_page(output_dir: &Path) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join(BOOKMARKS_PAGE_FILE);
    std::fs::write(&path, BOOKMARKS_PAGE)?;
    tracing::info!("Created/updated {}", BOOKMARKS_PAGE_FILE);
    Ok(path)
}
