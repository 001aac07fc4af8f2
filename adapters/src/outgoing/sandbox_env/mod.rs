pub mod flatpak_probe;
