pub mod torrent_info;
