pub mod d402_realtime_sales;
