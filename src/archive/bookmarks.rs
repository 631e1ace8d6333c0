//! Bookmark client code emitted into the archive
//!
//! The archive never stores bookmarks itself. It only ships client code
//! that talks to two JSON endpoints of whatever server hosts the archive:
//!
//! | Method | Path | Body |
//! |--------|------|------|
//! | `GET` | [`BOOKMARKS_ENDPOINT`] | returns `[{title, url}, ...]` in insertion order |
//! | `POST` | [`ADD_BOOKMARK_ENDPOINT`] | one `{title, url}`, de-duplicated by `url` |

// Endpoint literals shared by the constants and the `concat!`ed client code
macro_rules! bookmarks_endpoint {
    () => {
        "/api/bookmarks"
    };
}

macro_rules! add_bookmark_endpoint {
    () => {
        "/api/add_bookmark"
    };
}

/// Endpoint listing stored bookmarks
pub const BOOKMARKS_ENDPOINT: &str = bookmarks_endpoint!();

/// Endpoint adding one bookmark
pub const ADD_BOOKMARK_ENDPOINT: &str = add_bookmark_endpoint!();

/// Script appended to every saved page
///
/// Adds a fixed-position button that posts the document title and the
/// page's own path to [`ADD_BOOKMARK_ENDPOINT`].
pub const BOOKMARK_SCRIPT: &str = concat!(
    r#"
document.addEventListener('DOMContentLoaded', () => {
    const bookmarkBtn = document.createElement('button');
    bookmarkBtn.textContent = 'Bookmark';
    bookmarkBtn.style.position = 'fixed';
    bookmarkBtn.style.bottom = '20px';
    bookmarkBtn.style.right = '20px';
    bookmarkBtn.style.zIndex = '9999';
    bookmarkBtn.style.padding = '10px';
    bookmarkBtn.style.backgroundColor = '#007bff';
    bookmarkBtn.style.color = 'white';
    bookmarkBtn.style.border = 'none';
    bookmarkBtn.style.borderRadius = '5px';
    bookmarkBtn.style.cursor = 'pointer';
    document.body.appendChild(bookmarkBtn);

    bookmarkBtn.addEventListener('click', () => {
        fetch('"#,
    add_bookmark_endpoint!(),
    r#"', {
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
"#
);

/// Bookmarks viewer page, written once per crawl
pub const BOOKMARKS_PAGE: &str = concat!(
    r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Bookmarks</title>
    <style>
        body { font-family: -apple-system, BlinkMacSystemFont, sans-serif; padding: 2em; color: #333; }
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
            fetch('"#,
    bookmarks_endpoint!(),
    r#"')
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
"#
);
